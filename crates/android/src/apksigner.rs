//! `apksigner` integration
//!
//! Signs an APK with the resolved release identity. This is where a lenient
//! identity with missing fields finally fails. Passwords are handed over
//! through environment variables (`env:` password sources), never argv.

use crate::project::AndroidProject;
use crate::signing::{SigningError, SigningIdentity, SigningPolicy};
use napfinder_core::error::{Error, Result, ResultExt};
use napfinder_core::process::{run_command_with_env, which_command, CommandResult};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable carrying the keystore password
pub const KS_PASS_ENV: &str = "NAPFINDER_KS_PASS";
/// Environment variable carrying the key password
pub const KEY_PASS_ENV: &str = "NAPFINDER_KEY_PASS";

/// Arguments and environment for one `apksigner sign` call
#[derive(Clone, PartialEq, Eq)]
pub struct SignInvocation {
    /// Keystore file passed to `--ks`
    pub keystore: PathBuf,
    /// Arguments after `apksigner`
    pub args: Vec<String>,
    env: Vec<(String, String)>,
}

impl SignInvocation {
    /// Password environment variables; values are never logged
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }
}

impl fmt::Debug for SignInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInvocation")
            .field("keystore", &self.keystore)
            .field("args", &self.args)
            .field("env", &self.env.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

/// Build the `apksigner sign` invocation for `artifact`.
///
/// Reads every identity field, so any field missing under the lenient
/// policy surfaces here as [`SigningError::MissingField`].
pub fn sign_invocation(
    identity: &SigningIdentity,
    app_dir: &Path,
    artifact: &Path,
    output: Option<&Path>,
) -> std::result::Result<SignInvocation, SigningError> {
    let keystore = identity.store_file_path(app_dir)?;
    let key_password = identity.key_password()?;
    let store_password = identity.store_password()?;

    let mut args = vec![
        "sign".to_string(),
        "--ks".to_string(),
        keystore.to_string_lossy().into_owned(),
        "--ks-key-alias".to_string(),
        identity.key_alias().to_string(),
        "--ks-pass".to_string(),
        format!("env:{}", KS_PASS_ENV),
        "--key-pass".to_string(),
        format!("env:{}", KEY_PASS_ENV),
    ];

    if identity.v1_signing_enabled() {
        args.extend(["--v1-signing-enabled".to_string(), "true".to_string()]);
    }
    if identity.v2_signing_enabled() {
        args.extend(["--v2-signing-enabled".to_string(), "true".to_string()]);
    }
    if let Some(out) = output {
        args.extend(["--out".to_string(), out.to_string_lossy().into_owned()]);
    }
    args.push(artifact.to_string_lossy().into_owned());

    Ok(SignInvocation {
        keystore,
        args,
        env: vec![
            (KS_PASS_ENV.to_string(), store_password.to_string()),
            (KEY_PASS_ENV.to_string(), key_password.to_string()),
        ],
    })
}

/// Resolve the release identity and sign `artifact` with it
pub fn sign(
    project: &AndroidProject,
    policy: SigningPolicy,
    artifact: &Path,
    output: Option<&Path>,
) -> Result<CommandResult> {
    if !artifact.exists() {
        return Err(Error::file_not_found(artifact));
    }

    let resolution = project.resolve_signing(policy).map_err(Error::from)?;
    let identity = resolution.require_identity().map_err(Error::from)?;
    let invocation = sign_invocation(identity, &project.app_dir(), artifact, output)
        .map_err(Error::from)
        .context("While preparing apksigner arguments")?;

    if !invocation.keystore.exists() {
        return Err(Error::file_not_found(&invocation.keystore)
            .with_context(format!("storeFile from {}", identity.source().display())));
    }

    let program = which_command("apksigner").ok_or_else(|| Error::command_not_found("apksigner"))?;

    info!(artifact = %artifact.display(), alias = identity.key_alias(), "Signing artifact");
    run_command_with_env(&program.to_string_lossy(), &invocation.args, invocation.env(), project.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{CredentialField, PropertyKeys};
    use crate::signing::resolve;
    use napfinder_core::config::ConfigSchema;
    use napfinder_core::error::ErrorCode;
    use tempfile::TempDir;

    fn identity(dir: &TempDir, contents: &str, policy: SigningPolicy) -> SigningIdentity {
        let path = dir.path().join("key.properties");
        std::fs::write(&path, contents).unwrap();
        resolve(&path, &PropertyKeys::default(), policy)
            .unwrap()
            .into_identity()
            .unwrap()
    }

    #[test]
    fn test_strict_invocation() {
        let dir = TempDir::new().unwrap();
        let identity = identity(
            &dir,
            "keyAlias=upload\nkeyPassword=key-secret\nstoreFile=upload.jks\nstorePassword=store-secret\n",
            SigningPolicy::Strict,
        );

        let invocation = sign_invocation(
            &identity,
            Path::new("/p/android/app"),
            Path::new("app-release.apk"),
            Some(Path::new("signed.apk")),
        )
        .unwrap();

        assert_eq!(invocation.keystore, PathBuf::from("/p/android/app/upload.jks"));
        assert_eq!(
            invocation.args,
            vec![
                "sign",
                "--ks",
                "/p/android/app/upload.jks",
                "--ks-key-alias",
                "upload",
                "--ks-pass",
                "env:NAPFINDER_KS_PASS",
                "--key-pass",
                "env:NAPFINDER_KEY_PASS",
                "--v1-signing-enabled",
                "true",
                "--v2-signing-enabled",
                "true",
                "--out",
                "signed.apk",
                "app-release.apk",
            ]
        );
        assert!(!invocation.args.iter().any(|a| a.contains("secret")));
        assert_eq!(
            invocation.env(),
            &[
                (KS_PASS_ENV.to_string(), "store-secret".to_string()),
                (KEY_PASS_ENV.to_string(), "key-secret".to_string()),
            ]
        );
        assert!(!format!("{:?}", invocation).contains("secret"));
    }

    #[test]
    fn test_lenient_invocation_omits_scheme_flags() {
        let dir = TempDir::new().unwrap();
        let identity = identity(
            &dir,
            "keyAlias=upload\nkeyPassword=k\nstoreFile=/abs/upload.jks\nstorePassword=s\n",
            SigningPolicy::Lenient,
        );

        let invocation = sign_invocation(&identity, Path::new("/p/android/app"), Path::new("a.apk"), None).unwrap();
        assert_eq!(invocation.keystore, PathBuf::from("/abs/upload.jks"));
        assert!(!invocation.args.iter().any(|a| a.starts_with("--v1")));
        assert_eq!(invocation.args.last().map(String::as_str), Some("a.apk"));
    }

    #[test]
    fn test_lenient_missing_field_surfaces_at_use() {
        let dir = TempDir::new().unwrap();
        let identity = identity(&dir, "keyAlias=upload\nstoreFile=upload.jks\nstorePassword=s\n", SigningPolicy::Lenient);

        let err = sign_invocation(&identity, Path::new("/p"), Path::new("a.apk"), None).unwrap_err();
        match err {
            SigningError::MissingField { field, .. } => assert_eq!(field, CredentialField::KeyPassword),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sign_unsigned_release_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("android/app")).unwrap();
        let artifact = dir.path().join("app-release.apk");
        std::fs::write(&artifact, b"PK").unwrap();

        let project = AndroidProject::new(dir.path(), ConfigSchema::default());
        let err = sign(&project, SigningPolicy::Lenient, &artifact, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ReleaseUnsigned);
    }

    #[test]
    fn test_sign_missing_keystore() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("android/app")).unwrap();
        std::fs::write(
            dir.path().join("android/key.properties"),
            "keyAlias=upload\nkeyPassword=k\nstoreFile=missing.jks\nstorePassword=s\n",
        )
        .unwrap();
        let artifact = dir.path().join("app-release.apk");
        std::fs::write(&artifact, b"PK").unwrap();

        let project = AndroidProject::new(dir.path(), ConfigSchema::default());
        let err = sign(&project, SigningPolicy::Strict, &artifact, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.message.contains("missing.jks"));
    }

    #[test]
    fn test_sign_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let project = AndroidProject::new(dir.path(), ConfigSchema::default());
        let err = sign(&project, SigningPolicy::Lenient, &dir.path().join("nope.apk"), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
    }
}
