use camino::Utf8Path;
use config::{Config, ConfigError};

pub use zigate_api::config::*;

pub fn parse(filename: &Utf8Path) -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        .set_default("server.listen", "0.0.0.0")?
        .set_default("server.port", 8090)?
        .set_default("luup.url", "http://127.0.0.1:3480/")?
        .set_default("admin.state_file", "state.yaml")?
        .add_source(config::File::with_name(filename.as_str()))
        .build()?;

    settings.try_deserialize()
}
