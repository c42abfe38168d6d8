use semver::Version;

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version string {input:?}: {source}")]
    Invalid {
        input: String,
        #[source]
        source: semver::Error,
    },
    #[error("prerelease {0:?} has no numeric second identifier")]
    PrereleaseNumber(String),
}

/// Parses `input` and returns its fixed-width firmware encoding: one hex byte
/// per component, then the prerelease number or `ff` for a release build.
pub fn encode_hex(input: &str) -> Result<String, VersionError> {
    let input = input.trim();
    let version = Version::parse(input).map_err(|source| VersionError::Invalid {
        input: input.to_owned(),
        source,
    })?;
    to_hex(&version)
}

fn to_hex(version: &Version) -> Result<String, VersionError> {
    let suffix = match prerelease_number(version)? {
        Some(number) => format!("{:02x}", number),
        None => "ff".to_owned(),
    };
    Ok(format!(
        "{:02x}{:02x}{:02x}{}",
        version.major, version.minor, version.patch, suffix
    ))
}

/// Number carried by the second prerelease identifier, as in `rc.4`.
fn prerelease_number(version: &Version) -> Result<Option<u64>, VersionError> {
    if version.pre.is_empty() {
        return Ok(None);
    }

    let pre = version.pre.as_str();
    pre.split('.')
        .nth(1)
        .and_then(|id| id.parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| VersionError::PrereleaseNumber(pre.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_ends_in_ff() {
        assert_eq!(encode_hex("1.2.3").unwrap(), "010203ff");
        assert_eq!(encode_hex("0.10.255\n").unwrap(), "000affff");
    }

    #[test]
    fn prerelease_number_is_encoded() {
        assert_eq!(encode_hex("1.2.3-rc.4").unwrap(), "01020304");
        assert_eq!(encode_hex("2.0.0-beta.17+build.5").unwrap(), "02000011");
    }

    #[test]
    fn wide_components_are_not_truncated() {
        assert_eq!(encode_hex("256.1.1").unwrap(), "1000101ff");
    }

    #[test]
    fn prerelease_without_number_fails() {
        for (input, pre) in [("1.2.3-rc", "rc"), ("1.2.3-rc.final", "rc.final")] {
            match encode_hex(input) {
                Err(VersionError::PrereleaseNumber(found)) => assert_eq!(found, pre),
                other => panic!("{input:?}: expected PrereleaseNumber, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_malformed_versions() {
        for input in ["", "1.2", "1.2.3.4", "01.2.3", "1.a.3", "1.2.3-", "1.2.3-rc..1", "1.2.3+"] {
            assert!(
                matches!(encode_hex(input), Err(VersionError::Invalid { .. })),
                "{input:?}"
            );
        }
    }
}
