mod status_engine;
