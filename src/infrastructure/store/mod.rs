pub mod auth_file;
