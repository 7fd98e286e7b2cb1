//! Toolchain preflight probes.
//!
//! The pipeline shells out to a C compiler, `make`, a Tcl interpreter
//! (the engine's build scripts are Tcl-driven), and a Python interpreter,
//! and the engine links against the OpenSSL and SQLite development
//! packages. Probing these up front turns a mid-compile "command not
//! found" into an actionable report before any source is fetched.

use std::path::Path;

/// Outcome of a single preflight probe.
#[derive(Debug, Clone)]
pub struct Probe {
  /// What was probed ("cc", "make", "openssl headers", ...).
  pub name: String,

  /// Whether the probe succeeded.
  pub ok: bool,

  /// The resolved path on success, or what was searched on failure.
  pub detail: String,
}

/// Well-known locations of development headers on the supported build
/// environments (Debian/Alpine containers, macOS with Homebrew).
const HEADER_SEARCH_PATHS: [&str; 3] = ["/usr/include", "/usr/local/include", "/opt/homebrew/include"];

/// Run every preflight probe.
pub fn preflight(python: &str) -> Vec<Probe> {
  vec![
    probe_any_tool("cc", &["cc", "gcc", "clang"]),
    probe_tool("make"),
    probe_tool("tclsh"),
    probe_tool(python),
    probe_header("openssl headers", "openssl/evp.h"),
    probe_header("sqlite3 headers", "sqlite3.h"),
  ]
}

/// Whether every probe succeeded.
pub fn all_ok(probes: &[Probe]) -> bool {
  probes.iter().all(|probe| probe.ok)
}

/// Probe for a single program on PATH.
fn probe_tool(program: &str) -> Probe {
  match which::which(program) {
    Ok(path) => Probe {
      name: program.to_string(),
      ok: true,
      detail: path.display().to_string(),
    },
    Err(_) => Probe {
      name: program.to_string(),
      ok: false,
      detail: "not found in PATH".to_string(),
    },
  }
}

/// Probe for any of several interchangeable programs.
fn probe_any_tool(name: &str, candidates: &[&str]) -> Probe {
  for candidate in candidates {
    if let Ok(path) = which::which(candidate) {
      return Probe {
        name: name.to_string(),
        ok: true,
        detail: path.display().to_string(),
      };
    }
  }

  Probe {
    name: name.to_string(),
    ok: false,
    detail: format!("none of {} found in PATH", candidates.join(", ")),
  }
}

/// Probe for a development header in the well-known include directories.
fn probe_header(name: &str, header: &str) -> Probe {
  for base in HEADER_SEARCH_PATHS {
    let path = Path::new(base).join(header);
    if path.is_file() {
      return Probe {
        name: name.to_string(),
        ok: true,
        detail: path.display().to_string(),
      };
    }
  }

  Probe {
    name: name.to_string(),
    ok: false,
    detail: format!("'{}' not found under {}", header, HEADER_SEARCH_PATHS.join(", ")),
  }
}
