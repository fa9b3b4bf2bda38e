//! # Stage Executors
//!
//! [`StageExecutor`] is the capability boundary between the orchestrator
//! and the external toolchain. The production implementation
//! ([`ToolchainExecutor`]) shells out to `python3`, `node` and `snarkjs`;
//! the test double ([`scripted::ScriptedExecutor`], `scripted` feature)
//! fabricates plausible artifacts without any external processes.
//!
//! All invocations are argv-only — no shell is ever involved, and every
//! path handed to a tool comes from the [`ArtifactStore`](crate::ArtifactStore)
//! registry, never from user input.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::stage::Stage;

/// One request to run one stage: which stage, over which input artifacts,
/// producing which output artifacts. Paths are store-issued.
#[derive(Debug, Clone)]
pub struct StageInvocation {
    /// The stage to run.
    pub stage: Stage,
    /// Input artifact paths, in the order the stage's tool expects them.
    pub inputs: Vec<PathBuf>,
    /// Output artifact paths the stage must populate.
    pub outputs: Vec<PathBuf>,
}

/// What a successful stage invocation reports back.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    /// Captured standard output of the tool, trimmed.
    pub stdout: String,
}

/// Executes pipeline stages. Object-safe so the orchestrator can hold a
/// `dyn StageExecutor` and tests can substitute a scripted one.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    /// Run one stage to completion, populating every path in
    /// `invocation.outputs`.
    async fn execute(&self, invocation: &StageInvocation) -> Result<StageOutcome, PipelineError>;
}

/// Locations and limits for the external toolchain.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Directory holding `preprocess.py`, `app2.py` and
    /// `witness/generate_witness.js`.
    pub tool_dir: PathBuf,
    /// Compiled circuit used by witness generation.
    pub witness_wasm: PathBuf,
    /// Groth16 proving key handed to `snarkjs`.
    pub proving_key: PathBuf,
    /// Wall-clock limit for the preprocess stage.
    pub preprocess_timeout: Duration,
    /// Wall-clock limit for circuit-input construction.
    pub circuit_input_timeout: Duration,
    /// Wall-clock limit for witness generation.
    pub witness_timeout: Duration,
    /// Wall-clock limit for proving.
    pub prove_timeout: Duration,
}

impl ToolchainConfig {
    /// Conventional layout under a single toolchain directory, with the
    /// default per-stage limits.
    pub fn with_tool_dir(tool_dir: impl Into<PathBuf>) -> Self {
        let tool_dir = tool_dir.into();
        let witness_wasm = tool_dir.join("circuit.wasm");
        let proving_key = tool_dir.join("circuit_final.zkey");
        Self {
            tool_dir,
            witness_wasm,
            proving_key,
            preprocess_timeout: Duration::from_secs(60),
            circuit_input_timeout: Duration::from_secs(60),
            witness_timeout: Duration::from_secs(120),
            prove_timeout: Duration::from_secs(300),
        }
    }

    fn timeout_for(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Preprocess => self.preprocess_timeout,
            Stage::CircuitInput => self.circuit_input_timeout,
            Stage::Witness => self.witness_timeout,
            Stage::Prove => self.prove_timeout,
        }
    }
}

/// Production executor backed by the real external toolchain.
#[derive(Debug, Clone)]
pub struct ToolchainExecutor {
    config: ToolchainConfig,
}

impl ToolchainExecutor {
    /// Build an executor over the given toolchain layout.
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    fn command_for(&self, invocation: &StageInvocation) -> (String, Vec<PathBuf>) {
        let cfg = &self.config;
        match invocation.stage {
            Stage::Preprocess => {
                let mut args = vec![cfg.tool_dir.join("preprocess.py")];
                args.extend(invocation.inputs.iter().cloned());
                args.extend(invocation.outputs.iter().cloned());
                ("python3".to_owned(), args)
            }
            Stage::CircuitInput => {
                let mut args = vec![cfg.tool_dir.join("app2.py")];
                args.extend(invocation.inputs.iter().cloned());
                args.extend(invocation.outputs.iter().cloned());
                ("python3".to_owned(), args)
            }
            Stage::Witness => {
                let mut args = vec![
                    cfg.tool_dir.join("witness").join("generate_witness.js"),
                    cfg.witness_wasm.clone(),
                ];
                args.extend(invocation.inputs.iter().cloned());
                args.extend(invocation.outputs.iter().cloned());
                ("node".to_owned(), args)
            }
            Stage::Prove => {
                let mut args = vec![
                    PathBuf::from("groth16"),
                    PathBuf::from("prove"),
                    cfg.proving_key.clone(),
                ];
                args.extend(invocation.inputs.iter().cloned());
                args.extend(invocation.outputs.iter().cloned());
                ("snarkjs".to_owned(), args)
            }
        }
    }
}

#[async_trait]
impl StageExecutor for ToolchainExecutor {
    async fn execute(&self, invocation: &StageInvocation) -> Result<StageOutcome, PipelineError> {
        let (program, args) = self.command_for(invocation);
        debug!(stage = invocation.stage.as_str(), %program, "spawning stage tool");
        run_tool(
            invocation.stage,
            &program,
            &args,
            self.config.timeout_for(invocation.stage),
        )
        .await
    }
}

/// Spawn `program` with argv `args`, enforcing `limit`. The child runs as
/// its own process-group leader; at the limit the whole group is killed,
/// so workers forked by node or snarkjs do not outlive the stage.
pub(crate) async fn run_tool(
    stage: Stage,
    program: &str,
    args: &[PathBuf],
    limit: Duration,
) -> Result<StageOutcome, PipelineError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);
    let child = command.spawn()?;
    let pid = child.id();

    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            kill_process_group(pid);
            warn!(stage = stage.as_str(), limit_secs = limit.as_secs(), "stage timed out");
            return Err(PipelineError::Timeout {
                stage,
                limit_secs: limit.as_secs(),
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        let diagnostics = if stderr.is_empty() { stdout } else { stderr };
        warn!(
            stage = stage.as_str(),
            exit_code = ?output.status.code(),
            "stage tool failed"
        );
        return Err(PipelineError::ExternalProcessFailure {
            stage,
            exit_code: output.status.code(),
            diagnostics,
        });
    }

    Ok(StageOutcome { stdout })
}

/// SIGKILL the child's process group. A negative pid addresses the group;
/// the direct child is additionally covered by `kill_on_drop`.
#[cfg(unix)]
pub(crate) fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
pub(crate) fn kill_process_group(_pid: Option<u32>) {}

#[cfg(feature = "scripted")]
pub mod scripted {
    //! Scripted stand-in for the external toolchain, used by tests and by
    //! deployments without the real tools installed.

    use std::path::Path;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::PipelineError;
    use crate::stage::Stage;

    use super::{StageExecutor, StageInvocation, StageOutcome};

    /// Fabricates stage outputs deterministically. Configure which public
    /// signals the prove stage emits, and optionally a stage at which the
    /// run fails.
    #[derive(Debug, Clone)]
    pub struct ScriptedExecutor {
        public_signals: Vec<String>,
        fail_at: Option<Stage>,
        delay: Option<Duration>,
    }

    impl ScriptedExecutor {
        /// A run whose proof reports a biometric match.
        pub fn matching() -> Self {
            Self {
                public_signals: vec!["1".to_owned(), "92".to_owned()],
                fail_at: None,
                delay: None,
            }
        }

        /// A run whose proof reports no match.
        pub fn non_matching() -> Self {
            Self {
                public_signals: vec!["0".to_owned(), "17".to_owned()],
                fail_at: None,
                delay: None,
            }
        }

        /// A run that fails with a nonzero exit at `stage`.
        pub fn failing_at(stage: Stage) -> Self {
            Self {
                public_signals: Vec::new(),
                fail_at: Some(stage),
                delay: None,
            }
        }

        /// Sleep for `delay` before every stage, standing in for a slow
        /// external tool.
        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn write(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
            std::fs::write(path, bytes)?;
            Ok(())
        }
    }

    #[async_trait]
    impl StageExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            invocation: &StageInvocation,
        ) -> Result<StageOutcome, PipelineError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_at == Some(invocation.stage) {
                return Err(PipelineError::ExternalProcessFailure {
                    stage: invocation.stage,
                    exit_code: Some(1),
                    diagnostics: "scripted failure".to_owned(),
                });
            }
            match invocation.stage {
                Stage::Preprocess => {
                    Self::write(&invocation.outputs[0], b"\x80\x04scripted-features.")?;
                }
                Stage::CircuitInput => {
                    Self::write(
                        &invocation.outputs[0],
                        br#"{"probe":[1,2,3],"candidate":[1,2,4]}"#,
                    )?;
                }
                Stage::Witness => {
                    Self::write(&invocation.outputs[0], b"wtns\x02\x00\x00\x00scripted")?;
                }
                Stage::Prove => {
                    Self::write(
                        &invocation.outputs[0],
                        br#"{"pi_a":["1","2","1"],"pi_b":[["1","0"],["0","1"],["1","0"]],"pi_c":["3","4","1"],"protocol":"groth16","curve":"bn128"}"#,
                    )?;
                    let public = serde_json::to_vec(&self.public_signals)
                        .map_err(|err| PipelineError::MalformedArtifact {
                            stage: Stage::Prove,
                            reason: err.to_string(),
                        })?;
                    Self::write(&invocation.outputs[1], &public)?;
                }
            }
            Ok(StageOutcome {
                stdout: "OK".to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_tool_captures_stdout_on_success() {
        let outcome = run_tool(Stage::Preprocess, "echo", &[PathBuf::from("hello")], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(outcome.stdout, "hello");
    }

    #[tokio::test]
    async fn run_tool_reports_nonzero_exit() {
        let err = run_tool(Stage::Witness, "false", &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            PipelineError::ExternalProcessFailure { stage, exit_code, .. } => {
                assert_eq!(stage, Stage::Witness);
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn run_tool_kills_the_whole_group_on_timeout() {
        // `sh` forks a sleeping child of its own; the group kill has to
        // take down both.
        let err = run_tool(
            Stage::Prove,
            "sh",
            &[PathBuf::from("-c"), PathBuf::from("sleep 5 & wait")],
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        match err {
            PipelineError::Timeout { stage, .. } => assert_eq!(stage, Stage::Prove),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn run_tool_surfaces_missing_binary_as_io() {
        let err = run_tool(
            Stage::Preprocess,
            "definitely-not-a-real-binary",
            &[],
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn toolchain_commands_keep_argv_order() {
        let exec = ToolchainExecutor::new(ToolchainConfig::with_tool_dir("/opt/zkgate/tools"));
        let invocation = StageInvocation {
            stage: Stage::Prove,
            inputs: vec![PathBuf::from("/data/work/witness-a.wtns")],
            outputs: vec![
                PathBuf::from("/data/work/proof-a.json"),
                PathBuf::from("/data/work/public-a.json"),
            ],
        };
        let (program, args) = exec.command_for(&invocation);
        assert_eq!(program, "snarkjs");
        assert_eq!(
            args,
            vec![
                PathBuf::from("groth16"),
                PathBuf::from("prove"),
                PathBuf::from("/opt/zkgate/tools/circuit_final.zkey"),
                PathBuf::from("/data/work/witness-a.wtns"),
                PathBuf::from("/data/work/proof-a.json"),
                PathBuf::from("/data/work/public-a.json"),
            ]
        );
    }

    #[cfg(feature = "scripted")]
    mod scripted_tests {
        use super::*;
        use crate::executor::scripted::ScriptedExecutor;

        #[tokio::test]
        async fn scripted_prove_writes_proof_and_public_signals() {
            let dir = tempfile::tempdir().unwrap();
            let proof = dir.path().join("proof.json");
            let public = dir.path().join("public.json");
            let exec = ScriptedExecutor::matching();
            exec.execute(&StageInvocation {
                stage: Stage::Prove,
                inputs: vec![dir.path().join("witness.wtns")],
                outputs: vec![proof.clone(), public.clone()],
            })
            .await
            .unwrap();
            let signals: Vec<String> =
                serde_json::from_slice(&std::fs::read(public).unwrap()).unwrap();
            assert_eq!(signals[0], "1");
            let blob: serde_json::Value =
                serde_json::from_slice(&std::fs::read(proof).unwrap()).unwrap();
            assert!(blob.get("pi_a").is_some());
        }

        #[tokio::test]
        async fn scripted_failure_targets_one_stage() {
            let dir = tempfile::tempdir().unwrap();
            let exec = ScriptedExecutor::failing_at(Stage::Witness);
            let out = dir.path().join("features.pkl");
            exec.execute(&StageInvocation {
                stage: Stage::Preprocess,
                inputs: vec![dir.path().join("scan.tif")],
                outputs: vec![out.clone()],
            })
            .await
            .unwrap();
            assert!(out.exists());
            let err = exec
                .execute(&StageInvocation {
                    stage: Stage::Witness,
                    inputs: vec![],
                    outputs: vec![dir.path().join("w.wtns")],
                })
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                PipelineError::ExternalProcessFailure { stage: Stage::Witness, .. }
            ));
        }
    }
}
