use diesel::prelude::*;

use crate::db::models::project::Project;

pub struct ProjectsRepo;

impl ProjectsRepo {
    pub fn find_by_id(
        conn: &mut PgConnection,
        target_project_id: uuid::Uuid,
    ) -> Result<Option<Project>, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        projects
            .filter(id.eq(target_project_id))
            .select(Project::as_select())
            .first(conn)
            .optional()
    }
}
