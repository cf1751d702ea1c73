//! Options accepted by `configure`.

use crate::consts::DEFAULT_PREFIX;

/// Command-line options feeding toolchain derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
  /// Candidate C compilers, in order of preference.
  pub check_c_compiler: Vec<String>,
  /// Candidate C++ compilers, in order of preference.
  pub check_cxx_compiler: Vec<String>,
  pub prefix: String,
  pub debug: bool,
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self {
      check_c_compiler: vec!["gcc".to_string()],
      check_cxx_compiler: vec!["g++".to_string()],
      prefix: DEFAULT_PREFIX.to_string(),
      debug: false,
    }
  }
}

/// Split a compiler list given as `"gcc clang"` or `"gcc,clang"`.
pub fn parse_compiler_list(value: &str) -> Vec<String> {
  value
    .split(|c: char| c == ',' || c.is_whitespace())
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compiler_list_accepts_commas_and_spaces() {
    assert_eq!(parse_compiler_list("gcc, clang  icc"), vec!["gcc", "clang", "icc"]);
    assert!(parse_compiler_list(" , ").is_empty());
  }
}
