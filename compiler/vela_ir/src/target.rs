//! Target machine description.

/// Description of the target machine a unit is compiled for.
///
/// Codegen copies the triple and data-layout string into the output
/// module verbatim; it never interprets them beyond that.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TargetInfo {
    /// Target triple, e.g. `x86_64-unknown-linux-gnu`.
    pub triple: String,
    /// Data-layout string in LLVM's format.
    pub data_layout: String,
    /// Pointer width in bits.
    pub pointer_width: u32,
}

impl TargetInfo {
    /// A 64-bit Linux target, the default for tests and the driver.
    #[must_use]
    pub fn x86_64_linux() -> Self {
        Self {
            triple: "x86_64-unknown-linux-gnu".to_owned(),
            data_layout: "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-f80:128-n8:16:32:64-S128"
                .to_owned(),
            pointer_width: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target() {
        let target = TargetInfo::x86_64_linux();
        assert_eq!(target.pointer_width, 64);
        assert!(target.triple.starts_with("x86_64"));
    }
}
