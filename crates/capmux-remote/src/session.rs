//! Remote sessions over the system ssh client.
//!
//! A session is transient: host, username, and one piece of credential
//! material, valid for exactly one command execution. Key material is passed
//! with `-i` in batch mode; password material goes through `sshpass` with
//! the password in the child's environment, never on the command line.

use crate::channel::drain_child;
use capmux_proto::{Credentials, Error, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Complete output of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code of the remote command, when the transport reported one.
    pub exit_code: Option<i32>,
}

/// A one-command session against a remote host.
#[derive(Debug, Clone)]
pub struct RemoteSession {
    host: String,
    username: String,
    credentials: Credentials,
}

impl RemoteSession {
    /// Creates a session, validating the credential material before any
    /// network I/O is attempted.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self> {
        credentials.validate()?;
        Ok(Self {
            host: host.into(),
            username: username.into(),
            credentials,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Executes `command` on the remote host and drains its complete
    /// stdout/stderr.
    ///
    /// `poll` bounds each iteration of the output drain loop, not the total
    /// execution time.
    ///
    /// # Errors
    ///
    /// [`Error::CommandChannel`] when the transport cannot be spawned or
    /// fails; the ssh client's own connection/authentication failures
    /// surface as a non-zero exit code with the diagnostic on stderr.
    pub async fn execute(&self, command: &str, poll: Duration) -> Result<CommandOutput> {
        let mut transport = self.transport(command);
        transport.stdin(Stdio::null());
        transport.stdout(Stdio::piped());
        transport.stderr(Stdio::piped());

        debug!(host = %self.host, %command, "spawning remote command");
        let child = transport
            .spawn()
            .map_err(|e| Error::CommandChannel(format!("failed to spawn transport: {e}")))?;

        let (stdout, stderr, status) = drain_child(child, poll)
            .await
            .map_err(|e| Error::CommandChannel(e.to_string()))?;

        info!(host = %self.host, %command, code = ?status.code(), "remote command finished");
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code: status.code(),
        })
    }

    /// Builds the transport invocation for `command`.
    fn transport(&self, command: &str) -> Command {
        let destination = format!("{}@{}", self.username, self.host);

        if let Some(password) = self.credentials.password_material() {
            // sshpass reads the password from SSHPASS with -e
            let mut cmd = Command::new("sshpass");
            cmd.arg("-e")
                .env("SSHPASS", password)
                .arg("ssh")
                .arg("-o")
                .arg("StrictHostKeyChecking=accept-new")
                .arg(destination)
                .arg("--")
                .arg(command);
            cmd
        } else {
            // new() guarantees key material is present when password is not
            let key = self
                .credentials
                .key_material()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let mut cmd = Command::new("ssh");
            cmd.arg("-i")
                .arg(key)
                .arg("-o")
                .arg("BatchMode=yes")
                .arg("-o")
                .arg("StrictHostKeyChecking=accept-new")
                .arg(destination)
                .arg("--")
                .arg(command);
            cmd
        }
    }
}

/// Resolves an executable's path on the remote host via `which`.
///
/// Returns `None` when the executable is not on the remote PATH.
pub async fn remote_which(
    session: &RemoteSession,
    executable: &str,
    poll: Duration,
) -> Result<Option<String>> {
    let output = session.execute(&format!("which {executable}"), poll).await?;
    let path = output.stdout.trim();
    if path.is_empty() {
        Ok(None)
    } else {
        Ok(Some(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(cmd: &Command) -> Vec<String> {
        let std_cmd = cmd.as_std();
        std::iter::once(std_cmd.get_program())
            .chain(std_cmd.get_args())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_missing_credentials_fail_before_any_io() {
        let err = RemoteSession::new("h1", "root", Credentials::default()).unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailure(_)));
    }

    #[test]
    fn test_key_material_invocation() {
        let session =
            RemoteSession::new("192.168.1.15", "root", Credentials::key_file("/keys/dev.pem"))
                .unwrap();
        let argv = argv(&session.transport("lsblk -J"));

        assert_eq!(argv[0], "ssh");
        assert!(argv.windows(2).any(|w| w == ["-i", "/keys/dev.pem"]));
        assert!(argv.contains(&"BatchMode=yes".to_string()));
        assert!(argv.contains(&"root@192.168.1.15".to_string()));
        assert_eq!(argv.last().unwrap(), "lsblk -J");
    }

    #[test]
    fn test_password_material_uses_sshpass_env() {
        let session =
            RemoteSession::new("h1", "admin", Credentials::password("hunter2")).unwrap();
        let cmd = session.transport("uname -a");
        let argv = argv(&cmd);

        assert_eq!(argv[0], "sshpass");
        // Password travels in the environment, never in the argv
        assert!(!argv.iter().any(|a| a.contains("hunter2")));
        let envs: Vec<_> = cmd.as_std().get_envs().collect();
        assert!(envs.iter().any(|(k, v)| {
            k.to_str() == Some("SSHPASS") && v.and_then(|v| v.to_str()) == Some("hunter2")
        }));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_command_channel_error() {
        // An unresolvable host: batch-mode ssh fails fast, and a missing
        // ssh binary fails at spawn. Both are acceptable here.
        let session = RemoteSession::new(
            "invalid.host.invalid",
            "root",
            Credentials::key_file("/nonexistent/key.pem"),
        )
        .unwrap();

        match session
            .execute("true", Duration::from_millis(100))
            .await
        {
            // ssh missing entirely -> spawn failure
            Err(Error::CommandChannel(_)) => {}
            // ssh present -> batch mode fails fast with a non-zero code
            Ok(output) => {
                assert_ne!(output.exit_code, Some(0));
                assert!(!output.stderr.is_empty());
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
