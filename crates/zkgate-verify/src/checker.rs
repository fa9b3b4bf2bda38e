//! The raw checking capability: run the external verifier over a proof
//! and report exactly what it did, without interpreting the outcome.
//! Interpretation lives in [`crate::ProofVerifier`].

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

/// Infrastructure failure while running a check. Distinct from the proof
/// failing to verify, which is a normal [`CheckReport`].
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Filesystem failure staging blobs for the checker.
    #[error("verification I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the external checker did, uninterpreted.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Exit code, if the process ran to completion.
    pub exit_code: Option<i32>,
    /// Captured standard output, trimmed.
    pub stdout: String,
    /// Captured standard error, trimmed.
    pub stderr: String,
    /// Whether the check was killed at its wall-clock limit.
    pub timed_out: bool,
}

/// Runs the cryptographic check over staged proof and public-input files.
#[async_trait]
pub trait ProofChecker: Send + Sync {
    /// Check `proof_path` against `public_path` and the configured key.
    async fn check(
        &self,
        proof_path: &std::path::Path,
        public_path: &std::path::Path,
    ) -> Result<CheckReport, VerifyError>;
}

/// Locations and limits for the snarkjs verifier.
#[derive(Debug, Clone)]
pub struct SnarkjsConfig {
    /// Groth16 verification key for the circuit.
    pub verification_key: PathBuf,
    /// Wall-clock limit for one check.
    pub timeout: Duration,
}

impl SnarkjsConfig {
    /// Standard limits with the given key.
    pub fn with_key(verification_key: impl Into<PathBuf>) -> Self {
        Self {
            verification_key: verification_key.into(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Production checker shelling out to `snarkjs groth16 verify`.
#[derive(Debug, Clone)]
pub struct SnarkjsChecker {
    config: SnarkjsConfig,
}

impl SnarkjsChecker {
    /// Build a checker over the given key and limits.
    pub fn new(config: SnarkjsConfig) -> Self {
        Self { config }
    }

    /// Whether the configured verification key exists on disk.
    pub fn key_available(&self) -> bool {
        self.config.verification_key.is_file()
    }
}

#[async_trait]
impl ProofChecker for SnarkjsChecker {
    async fn check(
        &self,
        proof_path: &std::path::Path,
        public_path: &std::path::Path,
    ) -> Result<CheckReport, VerifyError> {
        debug!(key = %self.config.verification_key.display(), "running snarkjs verify");
        let mut command = Command::new("snarkjs");
        command
            .arg("groth16")
            .arg("verify")
            .arg(&self.config.verification_key)
            .arg(public_path)
            .arg(proof_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        let child = command.spawn()?;
        let pid = child.id();

        let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await
        {
            Ok(result) => result?,
            Err(_) => {
                kill_process_group(pid);
                return Ok(CheckReport {
                    timed_out: true,
                    ..CheckReport::default()
                })
            }
        };

        Ok(CheckReport {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            timed_out: false,
        })
    }
}

/// SIGKILL the checker's process group. snarkjs forks node workers; a
/// negative pid addresses the whole group.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Stage blobs into uniquely named files under `dir` for a checker run.
/// Returned paths are cleaned up by [`StagedBlobs::drop`].
pub(crate) struct StagedBlobs {
    /// Staged proof JSON.
    pub proof: PathBuf,
    /// Staged public-input JSON.
    pub public: PathBuf,
}

impl StagedBlobs {
    pub(crate) fn write(
        dir: &std::path::Path,
        proof: &[u8],
        public: &[u8],
    ) -> Result<Self, VerifyError> {
        let tag = Uuid::new_v4();
        let proof_path = dir.join(format!("verify-proof-{tag}.json"));
        let public_path = dir.join(format!("verify-public-{tag}.json"));
        std::fs::write(&proof_path, proof)?;
        std::fs::write(&public_path, public)?;
        Ok(Self {
            proof: proof_path,
            public: public_path,
        })
    }
}

impl Drop for StagedBlobs {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.proof);
        let _ = std::fs::remove_file(&self.public);
    }
}

#[cfg(feature = "scripted")]
pub mod scripted {
    //! Scripted checker for tests and snarkjs-less deployments.

    use async_trait::async_trait;

    use super::{CheckReport, ProofChecker, VerifyError};

    /// Returns a fixed report regardless of input.
    #[derive(Debug, Clone)]
    pub struct ScriptedChecker {
        report: CheckReport,
    }

    impl ScriptedChecker {
        /// A check that passes.
        pub fn passing() -> Self {
            Self {
                report: CheckReport {
                    exit_code: Some(0),
                    stdout: "[INFO]  snarkJS: OK!".to_owned(),
                    stderr: String::new(),
                    timed_out: false,
                },
            }
        }

        /// A clean cryptographic failure.
        pub fn clean_failure() -> Self {
            Self {
                report: CheckReport {
                    exit_code: Some(0),
                    stdout: "[ERROR] snarkJS: Invalid proof".to_owned(),
                    stderr: String::new(),
                    timed_out: false,
                },
            }
        }

        /// A crash with diagnostics, as a mangled artifact produces.
        pub fn crashing() -> Self {
            Self {
                report: CheckReport {
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: "TypeError: Cannot read properties of undefined".to_owned(),
                    timed_out: false,
                },
            }
        }

        /// A check killed at its time limit.
        pub fn timing_out() -> Self {
            Self {
                report: CheckReport {
                    timed_out: true,
                    ..CheckReport::default()
                },
            }
        }
    }

    #[async_trait]
    impl ProofChecker for ScriptedChecker {
        async fn check(
            &self,
            _proof_path: &std::path::Path,
            _public_path: &std::path::Path,
        ) -> Result<CheckReport, VerifyError> {
            Ok(self.report.clone())
        }
    }
}
