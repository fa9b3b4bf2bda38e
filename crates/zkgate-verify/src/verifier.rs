use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::checker::{CheckReport, ProofChecker, StagedBlobs, VerifyError};
use crate::verdict::Verdict;

/// Classifying front-end over a [`ProofChecker`].
///
/// Blobs are parsed *before* the checker runs: an archived artifact that
/// is no longer valid JSON of the right shape is reported as tampering
/// without spawning anything.
pub struct ProofVerifier {
    checker: Arc<dyn ProofChecker>,
    work_dir: PathBuf,
    key_available: bool,
}

impl ProofVerifier {
    /// Build a verifier staging its work files under `work_dir`.
    ///
    /// `key_available` reflects whether the verification key exists; when
    /// it does not, every check short-circuits to a clean failure.
    pub fn new(
        checker: Arc<dyn ProofChecker>,
        work_dir: impl Into<PathBuf>,
        key_available: bool,
    ) -> std::io::Result<Self> {
        let work_dir = work_dir.into();
        std::fs::create_dir_all(&work_dir)?;
        Ok(Self {
            checker,
            work_dir,
            key_available,
        })
    }

    /// Check one archived proof and classify the outcome. Deterministic
    /// for fixed blobs and key, and never mutates anything.
    pub async fn verify(&self, proof: &[u8], public: &[u8]) -> Result<Verdict, VerifyError> {
        if let Err(reason) = preparse_proof(proof) {
            return Ok(Verdict::tampered("archived proof blob is corrupt", Some(reason)));
        }
        if let Err(reason) = preparse_public(public) {
            return Ok(Verdict::tampered(
                "archived public-input blob is corrupt",
                Some(reason),
            ));
        }
        if !self.key_available {
            return Ok(Verdict::clean_failure(
                "verification key is unavailable; proof cannot be checked",
            ));
        }

        let staged = StagedBlobs::write(&self.work_dir, proof, public)?;
        let report = self.checker.check(&staged.proof, &staged.public).await?;
        let verdict = classify(&report);
        info!(
            verified = verdict.verified,
            tampered = verdict.tampered,
            "proof check complete"
        );
        Ok(verdict)
    }
}

/// Map a raw checker report onto a verdict.
///
/// Tampering is inferred from *how* the check failed: a crash, a kill
/// signal, or error diagnostics mean the checker choked on the artifacts,
/// which well-formed untampered artifacts never cause. A clean exit
/// without the success marker is an honest cryptographic non-match.
fn classify(report: &CheckReport) -> Verdict {
    if report.timed_out {
        return Verdict::clean_failure("verification timed out");
    }
    let diagnostics = if report.stderr.is_empty() {
        if report.stdout.is_empty() {
            None
        } else {
            Some(report.stdout.clone())
        }
    } else {
        Some(report.stderr.clone())
    };
    match report.exit_code {
        Some(0) if !report.stderr.is_empty() => {
            Verdict::tampered("verifier reported errors over the archived artifacts", diagnostics)
        }
        Some(0) if report.stdout.contains("OK") => Verdict::verified(),
        Some(0) => Verdict::clean_failure("proof does not verify for these public inputs"),
        _ => Verdict::tampered("verifier failed on the archived artifacts", diagnostics),
    }
}

fn preparse_proof(bytes: &[u8]) -> Result<(), String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    if value.is_object() {
        Ok(())
    } else {
        Err("proof is not a JSON object".to_owned())
    }
}

fn preparse_public(bytes: &[u8]) -> Result<(), String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    if value.as_array().is_some_and(|a| !a.is_empty()) {
        Ok(())
    } else {
        Err("public input is not a non-empty JSON array".to_owned())
    }
}
