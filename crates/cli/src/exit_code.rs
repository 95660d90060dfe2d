//! Process exit codes of `hbp`
//!
//! Scripts branch on these values, so each number keeps its meaning across
//! releases.

/// Exit status reported to the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Anything not covered below, including local I/O failures
    GeneralError = 1,

    /// Bad arguments, malformed path or URL, unusable configuration
    UsageError = 2,

    /// The backend could not be reached or answered with an unexpected status
    NetworkError = 3,

    /// Login failed, or the operation is not allowed (e.g. writing to a public container)
    AuthError = 4,

    /// Project, container or object does not exist
    NotFound = 5,

    /// The local target file already exists
    Conflict = 6,

    /// The backend has no equivalent for the operation
    UnsupportedFeature = 7,

    /// A move copied the object but left the source behind
    PartialFailure = 8,

    /// Ctrl-C
    Interrupted = 130,
}

impl ExitCode {
    const ALL: [ExitCode; 10] = [
        Self::Success,
        Self::GeneralError,
        Self::UsageError,
        Self::NetworkError,
        Self::AuthError,
        Self::NotFound,
        Self::Conflict,
        Self::UnsupportedFeature,
        Self::PartialFailure,
        Self::Interrupted,
    ];

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// The variant with numeric value `code`, if any
    pub fn from_i32(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_i32() == code)
    }
}

impl From<&hbp_core::Error> for ExitCode {
    fn from(err: &hbp_core::Error) -> Self {
        Self::from_i32(err.exit_code()).unwrap_or(Self::GeneralError)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use hbp_core::Error;

    use super::*;

    #[test]
    fn test_values_are_stable() {
        let expected = [0, 1, 2, 3, 4, 5, 6, 7, 8, 130];
        for (code, value) in ExitCode::ALL.iter().zip(expected) {
            assert_eq!(code.as_i32(), value);
            assert_eq!(ExitCode::from_i32(value), Some(*code));
        }
        assert_eq!(ExitCode::from_i32(99), None);
    }

    #[test]
    fn test_exit_code_from_error() {
        let cases = [
            (Error::InvalidUnit("PB".into()), ExitCode::UsageError),
            (Error::Config("no user name".into()), ExitCode::UsageError),
            (Error::transport("get_object", "c/p", "reset"), ExitCode::NetworkError),
            (Error::Auth("bad password".into()), ExitCode::AuthError),
            (Error::Permission("read-only".into()), ExitCode::AuthError),
            (Error::NotFound("c/p".into()), ExitCode::NotFound),
            (Error::FileExists(PathBuf::from("a.txt")), ExitCode::Conflict),
            (Error::UnsupportedFeature("acl".into()), ExitCode::UnsupportedFeature),
            (
                Error::PartialFailure {
                    from: "a/x".into(),
                    to: "b/x".into(),
                    reason: "timeout".into(),
                },
                ExitCode::PartialFailure,
            ),
            (Error::General("boom".into()), ExitCode::GeneralError),
        ];
        for (err, expected) in &cases {
            assert_eq!(ExitCode::from(err), *expected, "{err}");
        }
    }
}
