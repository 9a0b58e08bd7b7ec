mod database;
mod export_test;
mod pipeline_test;
mod provision_test;
