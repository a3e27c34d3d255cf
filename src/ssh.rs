use crate::config::Settings;
use ssh2::Session;
use std::fs;
use std::io::{self, Read};
use std::net::TcpStream;
use std::path::Path;

/// Narrow view of the remote appliance: list the backup directory, fetch one file.
pub trait RemoteStore {
    fn list(&self) -> io::Result<Vec<String>>;
    fn fetch(&self, remote_name: &str, local_path: &Path) -> io::Result<()>;
}

pub struct SftpStore<'a> {
    settings: &'a Settings,
}

impl<'a> SftpStore<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        SftpStore { settings }
    }
}

pub fn setup_ssh_session(settings: &Settings) -> Result<Session, io::Error> {
    let tcp = TcpStream::connect((settings.ssh_host.as_str(), settings.ssh_port))?;
    let mut sess = Session::new()?;
    sess.set_tcp_stream(tcp);
    sess.handshake()?;

    sess.userauth_pubkey_file(
        &settings.ssh_user,
        None,
        Path::new(&settings.identity_file),
        None,
    )?;

    if !sess.authenticated() {
        return Err(io::Error::new(io::ErrorKind::Other, "SSH authentication failed"));
    }

    Ok(sess)
}

impl RemoteStore for SftpStore<'_> {
    fn list(&self) -> io::Result<Vec<String>> {
        let sess = setup_ssh_session(self.settings)?;
        let sftp = sess.sftp()?;
        let remote_dir = Path::new(&self.settings.remote_backup_dir);

        let entries = sftp.readdir(remote_dir)?;
        let mut names = vec![];

        for (path, _) in entries {
            if let Some(filename) = path.file_name() {
                names.push(filename.to_string_lossy().into_owned());
            }
        }

        Ok(names)
    }

    fn fetch(&self, remote_name: &str, local_path: &Path) -> io::Result<()> {
        let sess = setup_ssh_session(self.settings)?;
        let sftp = sess.sftp()?;

        let remote_file_path = format!(
            "{}/{}",
            self.settings.remote_backup_dir.display(),
            remote_name
        );
        println!("Downloading file: {}", remote_file_path);

        let mut remote_file = sftp.open(Path::new(&remote_file_path)).map_err(|e| {
            println!("Failed to access remote file: {:?}", e);
            io::Error::new(io::ErrorKind::NotFound, "Remote file not found")
        })?;

        let mut data = vec![];
        remote_file.read_to_end(&mut data)?;
        fs::write(local_path, data)?;

        println!(
            "Backup {} successfully downloaded and staged as {}.",
            remote_name,
            local_path.display()
        );
        Ok(())
    }
}
