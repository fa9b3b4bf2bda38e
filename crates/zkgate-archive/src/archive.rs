use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::info;

use zkgate_core::{SubmissionId, UserId};

use crate::error::ArchiveError;
use crate::submission::{ProofSubmission, SubmissionStatus};

/// Criteria for listing submissions. All fields are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Keep only submissions with this status.
    pub status: Option<SubmissionStatus>,
    /// Keep only submissions whose user name or submission timestamp
    /// contains this text (case-insensitive).
    pub query: Option<String>,
}

struct StoredBlobs {
    proof: Vec<u8>,
    public_input: Vec<u8>,
}

/// In-memory proof archive with digest-checked blob storage.
///
/// Records and blobs are kept under separate locks because listings touch
/// only records, and blob downloads only blobs.
pub struct ProofArchive {
    records: RwLock<HashMap<SubmissionId, ProofSubmission>>,
    blobs: RwLock<HashMap<SubmissionId, StoredBlobs>>,
}

impl ProofArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Archive a new proof in the `pending` status.
    ///
    /// Blob shapes are validated here: the proof must be a JSON object and
    /// the public input a non-empty JSON array of decimal strings. Both
    /// are digested so later reads can detect corruption.
    pub fn submit(
        &self,
        user_id: UserId,
        user_name: impl Into<String>,
        match_found: bool,
        proof: Vec<u8>,
        public_input: Vec<u8>,
    ) -> Result<ProofSubmission, ArchiveError> {
        validate_proof_blob(&proof)?;
        validate_public_blob(&public_input)?;

        let record = ProofSubmission {
            id: SubmissionId::new(),
            user_id,
            user_name: user_name.into(),
            submitted_at: Utc::now(),
            match_found,
            status: SubmissionStatus::Pending,
            verification_notes: None,
            proof_digest: hex_digest(&proof),
            public_digest: hex_digest(&public_input),
        };
        info!(submission = %record.id, user = %user_id, match_found, "proof archived");

        self.blobs.write().insert(
            record.id,
            StoredBlobs {
                proof,
                public_input,
            },
        );
        self.records.write().insert(record.id, record.clone());
        Ok(record)
    }

    /// List submissions newest-first, applying `filter`.
    pub fn list(&self, filter: &ListFilter) -> Vec<ProofSubmission> {
        let needle = filter.query.as_deref().map(str::to_lowercase);
        let mut out: Vec<ProofSubmission> = self
            .records
            .read()
            .values()
            .filter(|record| filter.status.map_or(true, |s| record.status == s))
            .filter(|record| {
                needle.as_deref().map_or(true, |q| {
                    record.user_name.to_lowercase().contains(q)
                        || record.submitted_at.to_rfc3339().contains(q)
                })
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        out
    }

    /// Fetch a single submission record.
    pub fn get(&self, id: SubmissionId) -> Result<ProofSubmission, ArchiveError> {
        self.records
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))
    }

    /// Read back the proof blob, re-checking its digest.
    pub fn proof_bytes(&self, id: SubmissionId) -> Result<Vec<u8>, ArchiveError> {
        let record = self.get(id)?;
        let blobs = self.blobs.read();
        let stored = blobs
            .get(&id)
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))?;
        if hex_digest(&stored.proof) != record.proof_digest {
            return Err(ArchiveError::DigestMismatch { blob: "proof" });
        }
        Ok(stored.proof.clone())
    }

    /// Read back the public-input blob, re-checking its digest.
    pub fn public_bytes(&self, id: SubmissionId) -> Result<Vec<u8>, ArchiveError> {
        let record = self.get(id)?;
        let blobs = self.blobs.read();
        let stored = blobs
            .get(&id)
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))?;
        if hex_digest(&stored.public_input) != record.public_digest {
            return Err(ArchiveError::DigestMismatch {
                blob: "public input",
            });
        }
        Ok(stored.public_input.clone())
    }

    /// Apply a reviewer decision: status and notes change together, or not
    /// at all. Re-opening to `pending` clears the notes.
    pub fn set_status(
        &self,
        id: SubmissionId,
        to: SubmissionStatus,
        notes: Option<String>,
    ) -> Result<ProofSubmission, ArchiveError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| ArchiveError::NotFound(id.to_string()))?;
        if !record.status.can_transition_to(to) {
            return Err(ArchiveError::InvalidTransition {
                from: record.status,
                to,
            });
        }
        let from = record.status;
        record.status = to;
        record.verification_notes = match to {
            SubmissionStatus::Pending => None,
            _ => notes,
        };
        info!(submission = %id, from = from.as_str(), to = to.as_str(), "submission status changed");
        Ok(record.clone())
    }
}

impl Default for ProofArchive {
    fn default() -> Self {
        Self::new()
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn validate_proof_blob(bytes: &[u8]) -> Result<(), ArchiveError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|err| ArchiveError::InvalidBlob {
            blob: "proof",
            reason: err.to_string(),
        })?;
    if !value.is_object() {
        return Err(ArchiveError::InvalidBlob {
            blob: "proof",
            reason: "expected a JSON object".to_owned(),
        });
    }
    Ok(())
}

fn validate_public_blob(bytes: &[u8]) -> Result<(), ArchiveError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|err| ArchiveError::InvalidBlob {
            blob: "public input",
            reason: err.to_string(),
        })?;
    let signals = value.as_array().ok_or_else(|| ArchiveError::InvalidBlob {
        blob: "public input",
        reason: "expected a JSON array".to_owned(),
    })?;
    if signals.is_empty() {
        return Err(ArchiveError::InvalidBlob {
            blob: "public input",
            reason: "signal array is empty".to_owned(),
        });
    }
    for signal in signals {
        let ok = signal
            .as_str()
            .map_or(false, |s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
        if !ok {
            return Err(ArchiveError::InvalidBlob {
                blob: "public input",
                reason: "signals must be decimal strings".to_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROOF: &[u8] = br#"{"pi_a":["1","2","1"],"protocol":"groth16"}"#;
    const PUBLIC: &[u8] = br#"["1","92"]"#;

    fn archived(archive: &ProofArchive, name: &str) -> ProofSubmission {
        archive
            .submit(UserId::new(), name, true, PROOF.to_vec(), PUBLIC.to_vec())
            .unwrap()
    }

    #[test]
    fn submit_starts_pending_with_digests() {
        let archive = ProofArchive::new();
        let record = archived(&archive, "alice");
        assert_eq!(record.status, SubmissionStatus::Pending);
        assert_eq!(record.proof_digest.len(), 64);
        assert_eq!(archive.proof_bytes(record.id).unwrap(), PROOF);
        assert_eq!(archive.public_bytes(record.id).unwrap(), PUBLIC);
    }

    #[test]
    fn malformed_blobs_are_rejected_at_submission() {
        let archive = ProofArchive::new();
        let user = UserId::new();
        // Proof must be an object.
        assert!(matches!(
            archive.submit(user, "a", true, b"[1,2]".to_vec(), PUBLIC.to_vec()),
            Err(ArchiveError::InvalidBlob { blob: "proof", .. })
        ));
        // Public input must be an array of decimal strings.
        for bad in [&b"{}"[..], br#"[]"#, br#"["1",7]"#, br#"["1","0x2a"]"#, b"junk"] {
            assert!(matches!(
                archive.submit(user, "a", true, PROOF.to_vec(), bad.to_vec()),
                Err(ArchiveError::InvalidBlob { blob: "public input", .. })
            ));
        }
    }

    #[test]
    fn list_is_newest_first_and_filters() {
        let archive = ProofArchive::new();
        let a = archived(&archive, "Alice Smith");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = archived(&archive, "Bob Jones");
        archive
            .set_status(b.id, SubmissionStatus::Verified, Some("checked".into()))
            .unwrap();

        let all = archive.list(&ListFilter::default());
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id);
        assert_eq!(all[1].id, a.id);

        let verified = archive.list(&ListFilter {
            status: Some(SubmissionStatus::Verified),
            query: None,
        });
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].id, b.id);

        let named = archive.list(&ListFilter {
            status: None,
            query: Some("alice".into()),
        });
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].id, a.id);

        // The free-text filter also matches the submission timestamp.
        let dated = archive.list(&ListFilter {
            status: None,
            query: Some(a.submitted_at.format("%Y-").to_string()),
        });
        assert_eq!(dated.len(), 2);
    }

    #[test]
    fn status_and_notes_change_atomically() {
        let archive = ProofArchive::new();
        let record = archived(&archive, "alice");
        let updated = archive
            .set_status(record.id, SubmissionStatus::Rejected, Some("key mismatch".into()))
            .unwrap();
        assert_eq!(updated.status, SubmissionStatus::Rejected);
        assert_eq!(updated.verification_notes.as_deref(), Some("key mismatch"));

        // Illegal transition leaves both fields untouched.
        let err = archive
            .set_status(record.id, SubmissionStatus::Verified, Some("flip".into()))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidTransition { .. }));
        let current = archive.get(record.id).unwrap();
        assert_eq!(current.status, SubmissionStatus::Rejected);
        assert_eq!(current.verification_notes.as_deref(), Some("key mismatch"));
    }

    #[test]
    fn reopening_clears_notes() {
        let archive = ProofArchive::new();
        let record = archived(&archive, "alice");
        archive
            .set_status(record.id, SubmissionStatus::Verified, Some("ok".into()))
            .unwrap();
        let reopened = archive
            .set_status(record.id, SubmissionStatus::Pending, None)
            .unwrap();
        assert_eq!(reopened.status, SubmissionStatus::Pending);
        assert!(reopened.verification_notes.is_none());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Digests are 64 lowercase hex characters for any blob.
            #[test]
            fn digests_are_lowercase_hex_sha256(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
                let digest = hex_digest(&bytes);
                prop_assert_eq!(digest.len(), 64);
                prop_assert!(digest.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
            }

            /// Every non-empty array of decimal strings is a valid public blob.
            #[test]
            fn decimal_signal_arrays_validate(signals in proptest::collection::vec("[0-9]{1,20}", 1..8)) {
                let bytes = serde_json::to_vec(&signals).unwrap();
                prop_assert!(validate_public_blob(&bytes).is_ok());
            }
        }
    }

    #[test]
    fn unknown_submission_is_not_found() {
        let archive = ProofArchive::new();
        let id = SubmissionId::new();
        assert!(matches!(archive.get(id), Err(ArchiveError::NotFound(_))));
        assert!(matches!(archive.proof_bytes(id), Err(ArchiveError::NotFound(_))));
        assert!(matches!(
            archive.set_status(id, SubmissionStatus::Verified, None),
            Err(ArchiveError::InvalidTransition { .. }) | Err(ArchiveError::NotFound(_))
        ));
    }
}
