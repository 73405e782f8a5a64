pub mod aggregate;
pub mod certificate;
pub mod db;
pub mod importer;
pub mod routes;
pub mod theme;

use std::path::PathBuf;

use db::DbPool;
use theme::ThemeStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub theme: ThemeStore,
    pub cert_template_path: PathBuf,
}
