//! Static registry mapping language ids to execution profiles.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Language profile used for raw-command requests that name no language.
pub const DEFAULT_LANGUAGE: &str = "python";

/// How to build and run one language inside a container.
///
/// `run_command` is a single shell command executed from the mounted
/// workspace; compile-then-run languages express the whole pipeline as one
/// compound command. It references only the fixed source file name the
/// workspace manager writes (`main` + `extension`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionProfile {
    pub language: &'static str,
    pub image: &'static str,
    pub run_command: &'static str,
    pub extension: &'static str,
    /// Extra flags passed to the container runtime, e.g. GPU selection.
    pub runtime_flags: &'static str,
}

static PROFILES: &[ExecutionProfile] = &[
    ExecutionProfile {
        language: "python",
        image: "nvcr.io/nvidia/l4t-ml:r32.6.1-py3",
        run_command: "python3 main.py",
        extension: ".py",
        runtime_flags: "--runtime nvidia",
    },
    ExecutionProfile {
        language: "c",
        image: "nvcr.io/nvidia/l4t-base:r32.6.1",
        run_command: "apt-get update && apt-get install -y build-essential && gcc -o /tmp/output main.c && /tmp/output",
        extension: ".c",
        runtime_flags: "--runtime nvidia",
    },
    ExecutionProfile {
        language: "cpp",
        image: "nvcr.io/nvidia/l4t-base:r32.6.1",
        run_command: "apt-get update && apt-get install -y build-essential && g++ -o /tmp/output main.cpp && /tmp/output",
        extension: ".cpp",
        runtime_flags: "--runtime nvidia",
    },
    ExecutionProfile {
        language: "cuda",
        image: "nvcr.io/nvidia/l4t-ml:r32.6.1-py3",
        run_command: "nvcc -ccbin aarch64-linux-gnu-g++ main.cu -o /tmp/output && /tmp/output",
        extension: ".cu",
        runtime_flags: "--runtime nvidia",
    },
];

/// Looks up the profile for a language id. Pure and O(1); a missing key is
/// a recoverable condition, not a fault.
pub fn lookup(language: &str) -> Option<&'static ExecutionProfile> {
    static INDEX: OnceLock<HashMap<&'static str, &'static ExecutionProfile>> = OnceLock::new();
    INDEX
        .get_or_init(|| PROFILES.iter().map(|p| (p.language, p)).collect())
        .get(language)
        .copied()
}

/// All registered language ids.
pub fn supported_languages() -> impl Iterator<Item = &'static str> {
    PROFILES.iter().map(|p| p.language)
}
