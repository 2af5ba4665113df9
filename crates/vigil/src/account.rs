//! Credential sources from the host: password file, account database and
//! helper programs, plus the privilege drop that follows reading them

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use nix::unistd::{
    getegid, geteuid, getgid, getuid, setegid, seteuid, setgid, setuid, Uid, User,
};
use tracing::{debug, info};
use vigil_core::{ExternalAuthenticator, LockError, Result};
use zeroize::Zeroizing;

/// System shadow database
pub const SHADOW_PATH: &str = "/etc/shadow";

/// Read the unlock secret from `path`
///
/// Everything up to the first CR or LF counts. A missing or empty file
/// yields `None`.
pub fn read_password_file(path: &Path) -> Result<Option<Zeroizing<Vec<u8>>>> {
    let content = match std::fs::read(path) {
        Ok(content) => Zeroizing::new(content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No password file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let line = content
        .split(|&b| b == b'\r' || b == b'\n')
        .next()
        .unwrap_or_default();
    if line.is_empty() {
        return Ok(None);
    }
    info!("Using secret from {}", path.display());
    Ok(Some(Zeroizing::new(line.to_vec())))
}

/// crypt(3) hash of the invoking user's account
///
/// A passwd field of `x` means the hash lives in the shadow database. An
/// empty field yields `None` so another backend can be used.
pub fn account_hash() -> Result<Option<String>> {
    let user = lookup_user(getuid())?;
    let field = Zeroizing::new(user.passwd.to_string_lossy().into_owned());

    match field.as_str() {
        "" => Ok(None),
        "x" => shadow_hash(&user.name, Path::new(SHADOW_PATH)),
        hash => Ok(Some(hash.to_string())),
    }
}

fn lookup_user(uid: Uid) -> Result<User> {
    User::from_uid(uid)
        .map_err(|e| LockError::Credential(format!("cannot look up uid {}: {}", uid, e)))?
        .ok_or_else(|| LockError::Credential(format!("no passwd entry for uid {}", uid)))
}

/// Hash for `name` from a shadow-format file
pub fn shadow_hash(name: &str, path: &Path) -> Result<Option<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LockError::Credential(format!(
            "cannot read {} ({}); is vigil installed setuid root?",
            path.display(),
            e
        ))
    })?;
    let content = Zeroizing::new(content);
    Ok(parse_shadow(&content, name))
}

/// Second field of the line whose first field is `name`
pub fn parse_shadow(content: &str, name: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let mut fields = line.split(':');
        (fields.next() == Some(name))
            .then(|| fields.next())
            .flatten()
            .filter(|hash| !hash.is_empty())
            .map(str::to_string)
    })
}

/// Run `f` with the effective ids of the invoking user
///
/// Paths the user chooses (config file, password file) are opened this way so
/// a setuid install never reads them as root. The elevated ids are restored
/// afterwards; without elevated ids `f` just runs.
pub fn as_invoking_user<T>(f: impl FnOnce() -> T) -> Result<T> {
    let (uid, euid) = (getuid(), geteuid());
    let (gid, egid) = (getgid(), getegid());
    if uid == euid && gid == egid {
        return Ok(f());
    }

    setegid(gid).map_err(|e| LockError::Credential(format!("cannot switch group: {}", e)))?;
    seteuid(uid).map_err(|e| LockError::Credential(format!("cannot switch user: {}", e)))?;
    let result = f();
    seteuid(euid).map_err(|e| LockError::Credential(format!("cannot restore user: {}", e)))?;
    setegid(egid).map_err(|e| LockError::Credential(format!("cannot restore group: {}", e)))?;
    Ok(result)
}

/// Give up elevated privileges once the account database has been read
///
/// A no-op unless the effective user is root and the real user is not.
pub fn drop_privileges() -> Result<()> {
    let uid = getuid();
    if !nix::unistd::geteuid().is_root() || uid.is_root() {
        return Ok(());
    }

    let gid = getgid();
    setgid(gid).map_err(|e| LockError::Credential(format!("cannot drop group privileges: {}", e)))?;
    setuid(uid).map_err(|e| LockError::Credential(format!("cannot drop user privileges: {}", e)))?;
    info!("Dropped privileges to uid {}", uid);
    Ok(())
}

/// External program that verifies a secret written to its stdin
///
/// Exit status zero means the secret is correct.
#[derive(Clone, Debug)]
pub struct HelperProgram {
    program: PathBuf,
}

impl HelperProgram {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ExternalAuthenticator for HelperProgram {
    fn authenticate(&self, candidate: &[u8]) -> Result<bool> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                LockError::Verification(format!("cannot run {}: {}", self.program.display(), e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(candidate) {
                Ok(()) => {}
                // helper decided without reading everything
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(child.wait()?.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    const SHADOW: &str = "\
root:!:19000:0:99999:7:::
alice:$6$salt$hash:19000:0:99999:7:::
bob::19000:0:99999:7:::
";

    #[rstest]
    #[case(b"hunter2\n".as_slice(), Some(b"hunter2".as_slice()))]
    #[case(b"hunter2\r\n".as_slice(), Some(b"hunter2".as_slice()))]
    #[case(b"hunter2".as_slice(), Some(b"hunter2".as_slice()))]
    #[case(b"first\nsecond\n".as_slice(), Some(b"first".as_slice()))]
    #[case(b"abc\rdef\n".as_slice(), Some(b"abc".as_slice()))]
    #[case(b"\rhunter2\n".as_slice(), None)]
    #[case(b"\n".as_slice(), None)]
    #[case(b"".as_slice(), None)]
    fn test_password_file(#[case] content: &[u8], #[case] expected: Option<&[u8]>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        std::fs::write(&path, content).unwrap();

        let secret = read_password_file(&path).unwrap();
        assert_eq!(secret.as_deref().map(|s| s.as_slice()), expected);
    }

    #[test]
    fn test_as_invoking_user_reads_and_restores_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        std::fs::write(&path, b"hunter2\n").unwrap();
        let before = (geteuid(), getegid());

        let secret = as_invoking_user(|| read_password_file(&path))
            .and_then(|read| read)
            .unwrap();

        assert_eq!(secret.as_deref().map(|s| s.as_slice()), Some(b"hunter2".as_slice()));
        assert_eq!((geteuid(), getegid()), before);
    }

    #[test]
    fn test_missing_password_file() {
        let dir = TempDir::new().unwrap();
        assert!(read_password_file(&dir.path().join("absent"))
            .unwrap()
            .is_none());
    }

    #[rstest]
    #[case("alice", Some("$6$salt$hash"))]
    #[case("root", Some("!"))]
    #[case("bob", None)]
    #[case("carol", None)]
    #[case("ali", None)]
    fn test_parse_shadow(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_shadow(SHADOW, name).as_deref(), expected);
    }

    #[test]
    fn test_unreadable_shadow_is_credential_error() {
        let dir = TempDir::new().unwrap();
        let result = shadow_hash("alice", &dir.path().join("shadow"));
        assert!(matches!(result, Err(LockError::Credential(_))));
    }

    #[test]
    fn test_helper_exit_status() {
        assert!(HelperProgram::new("true").authenticate(b"secret").unwrap());
        assert!(!HelperProgram::new("false").authenticate(b"secret").unwrap());
    }

    #[test]
    fn test_missing_helper_is_verification_error() {
        let result = HelperProgram::new("/nonexistent/vigil-helper").authenticate(b"x");
        assert!(matches!(result, Err(LockError::Verification(_))));
    }
}
