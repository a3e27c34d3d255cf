use config::{Config, File};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Settings {
    pub remote_backup_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub backup_suffix: String,
    pub min_expected_count: usize,
    pub retention_days: i64,
    pub ssh_host: String,
    pub ssh_port: u16,
    pub ssh_user: String,
    pub identity_file: PathBuf,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_from: String,
    pub smtp_recipients: Vec<String>,
}

pub fn load_config(config_path: PathBuf) -> Result<Settings, config::ConfigError> {
    let settings = Config::builder()
        .add_source(File::from(config_path))
        .build()?;

    Ok(Settings {
        remote_backup_dir: settings.get::<String>("backup.remote_backup_dir")?.into(),
        staging_dir: settings.get::<String>("backup.staging_dir")?.into(),
        backup_suffix: settings.get::<String>("backup.backup_suffix")?,
        min_expected_count: settings.get::<usize>("backup.min_expected_count")?,
        retention_days: settings.get::<i64>("backup.retention_days")?,
        ssh_host: settings.get::<String>("ssh.host")?,
        ssh_port: settings.get::<u16>("ssh.port")?,
        ssh_user: settings.get::<String>("ssh.user")?,
        identity_file: settings.get::<String>("ssh.identity_file")?.into(),
        smtp_server: settings.get::<String>("smtp.server")?,
        smtp_port: settings.get::<u16>("smtp.port")?,
        smtp_from: settings.get::<String>("smtp.from")?,
        smtp_recipients: settings
            .get_array("smtp.recipients")?
            .into_iter()
            .map(|r| r.into_string().unwrap())
            .collect(),
    })
}
