use diesel::prelude::*;

use crate::db::models::auth::User;

pub struct UsersRepo;

impl UsersRepo {
    pub fn find_active_by_id(
        conn: &mut PgConnection,
        user_id: uuid::Uuid,
    ) -> Result<Option<User>, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        users
            .filter(id.eq(user_id))
            .filter(is_active.eq(true))
            .select(User::as_select())
            .first(conn)
            .optional()
    }
}
