use serde::Deserialize;

use crate::config::Config;
use crate::directory::Directory;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub directory: Option<Directory>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            config,
            directory: None,
        }
    }
}
