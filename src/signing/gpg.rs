//! Detached signatures through the system `gpg`
//!
//! In-memory keys are imported into a throwaway keyring that lives only as
//! long as the signer. Agent mode signs with the user's own keyring.

use crate::core::error::{QuayError, QuayResult, ResultExt};
use crate::core::secret::Secret;
use crate::signing::{AgentRef, Signer, SigningCredential};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

enum Keyring {
  Ephemeral { home: TempDir, passphrase: Secret },
  Agent { key_id: Option<String> },
}

pub struct GpgSigner {
  program: String,
  keyring: Keyring,
}

impl GpgSigner {
  /// Prepare a signer for the resolved credential
  ///
  /// For an in-memory key this imports the key material; a key gpg refuses
  /// to import is an error here rather than at the first signature.
  pub fn new(credential: &SigningCredential) -> QuayResult<Self> {
    match credential {
      SigningCredential::InMemory { key, passphrase, program } => {
        let home = keyring_dir()?;
        import_key(program, home.path(), key)?;
        Ok(Self {
          program: program.clone(),
          keyring: Keyring::Ephemeral {
            home,
            passphrase: passphrase.clone(),
          },
        })
      }
      SigningCredential::Agent(AgentRef { program, key_id }) => Ok(Self {
        program: program.clone(),
        keyring: Keyring::Agent { key_id: key_id.clone() },
      }),
    }
  }

  fn sign_args(&self, data: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--batch".into(), "--no-tty".into(), "--yes".into()];
    match &self.keyring {
      Keyring::Ephemeral { home, .. } => {
        args.push("--homedir".into());
        args.push(home.path().into());
        args.extend(["--pinentry-mode", "loopback", "--passphrase-fd", "0"].map(OsString::from));
      }
      Keyring::Agent { key_id } => {
        if let Some(id) = key_id {
          args.push("--local-user".into());
          args.push(id.into());
        }
      }
    }
    args.extend(["--armor", "--detach-sign", "--output", "-"].map(OsString::from));
    args.push(data.into());
    args
  }
}

impl Signer for GpgSigner {
  fn sign(&self, data: &[u8]) -> QuayResult<Vec<u8>> {
    let mut file = tempfile::NamedTempFile::new().context("Failed to stage data for signing")?;
    file.write_all(data).context("Failed to stage data for signing")?;
    file.flush()?;

    let stdin = match &self.keyring {
      Keyring::Ephemeral { passphrase, .. } => Some(format!("{}\n", passphrase.expose())),
      Keyring::Agent { .. } => None,
    };

    let output = run(&self.program, &self.sign_args(file.path()), stdin.as_deref())?;
    if !output.starts_with(b"-----BEGIN PGP SIGNATURE-----") {
      return Err(QuayError::message(format!("{} produced no armored signature", self.program)));
    }
    Ok(output)
  }
}

/// Owner-only directory for a throwaway keyring; gpg warns on anything looser
fn keyring_dir() -> QuayResult<TempDir> {
  let mut builder = tempfile::Builder::new();
  builder.prefix("quay-gnupg-");
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    builder.permissions(std::fs::Permissions::from_mode(0o700));
  }
  builder.tempdir().context("Failed to create temporary keyring")
}

fn import_key(program: &str, home: &Path, key: &Secret) -> QuayResult<()> {
  let args: Vec<OsString> = vec![
    "--batch".into(),
    "--no-tty".into(),
    "--homedir".into(),
    home.into(),
    "--import".into(),
  ];
  run(program, &args, Some(key.expose())).context("Failed to import signing key")?;
  Ok(())
}

/// Run gpg with optional stdin, returning stdout
///
/// stderr is surfaced on failure; stdin is never echoed into errors.
fn run(program: &str, args: &[OsString], stdin: Option<&str>) -> QuayResult<Vec<u8>> {
  let mut child = Command::new(program)
    .args(args)
    .env("LC_ALL", "C")
    .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .with_context(|| format!("Failed to execute {}", program))?;

  if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
    pipe.write_all(input.as_bytes())?;
  }

  let output = child.wait_with_output()?;
  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(QuayError::message(format!(
      "{} exited with {}: {}",
      program,
      output.status,
      stderr.trim()
    )));
  }
  Ok(output.stdout)
}
