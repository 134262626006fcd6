//! Expectations on a finished command

use serde::{Deserialize, Deserializer};

use super::action::Outcome;

/// The `assert` block of an exec unit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expect {
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default)]
    pub out: Option<PipeExpect>,
    #[serde(default)]
    pub err: Option<PipeExpect>,
}

/// Expectations on the contents of stdout or stderr
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipeExpect {
    /// Exact content, compared with surrounding whitespace trimmed
    #[serde(default)]
    pub is: Option<String>,
    /// Every one of these must appear
    #[serde(default, deserialize_with = "one_or_many")]
    pub contains: Vec<String>,
    /// At least one of these must appear
    #[serde(default, deserialize_with = "one_or_many")]
    pub contains_one_of: Vec<String>,
    /// None of these may appear
    #[serde(default, deserialize_with = "one_or_many")]
    pub none_of: Vec<String>,
}

impl Expect {
    /// Check `outcome`, returning one message per failed assertion
    pub fn evaluate(&self, outcome: &Outcome) -> Vec<String> {
        let mut failures = Vec::new();
        if outcome.exit_code != self.exit_code {
            failures.push(format!(
                "not equal: expected exit code {} but got {}",
                self.exit_code, outcome.exit_code
            ));
        }
        if let Some(out) = &self.out {
            out.evaluate("stdout", &outcome.stdout, &mut failures);
        }
        if let Some(err) = &self.err {
            err.evaluate("stderr", &outcome.stderr, &mut failures);
        }
        failures
    }
}

impl PipeExpect {
    fn evaluate(&self, pipe: &str, content: &str, failures: &mut Vec<String>) {
        if let Some(expected) = &self.is {
            let got = content.trim();
            if got != expected.trim() {
                failures.push(format!("not equal: expected {expected} but got {got}"));
            }
        }
        for needle in &self.contains {
            if !content.contains(needle.as_str()) {
                failures.push(format!("expected {pipe} to contain {needle}"));
            }
        }
        if !self.contains_one_of.is_empty()
            && !self.contains_one_of.iter().any(|n| content.contains(n.as_str()))
        {
            failures.push(format!(
                "expected {pipe} to contain one of {:?}",
                self.contains_one_of
            ));
        }
        for needle in &self.none_of {
            if content.contains(needle.as_str()) {
                failures.push(format!("expected {pipe} not to contain {needle}"));
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(exit_code: i32, stdout: &str) -> Outcome {
        Outcome {
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_default_expects_success() {
        let expect = Expect::default();
        assert!(expect.evaluate(&outcome(0, "")).is_empty());
        assert_eq!(
            expect.evaluate(&outcome(2, "")),
            vec!["not equal: expected exit code 0 but got 2"]
        );
    }

    #[test]
    fn test_is_trims_output() {
        let expect: Expect = serde_yaml::from_str("out:\n  is: dat\n").unwrap();
        assert_eq!(
            expect.evaluate(&outcome(0, "cat\n")),
            vec!["not equal: expected dat but got cat"]
        );
        let expect: Expect = serde_yaml::from_str("out:\n  is: cat\n").unwrap();
        assert!(expect.evaluate(&outcome(0, "cat\n")).is_empty());
    }

    #[test]
    fn test_contains_variants() {
        let expect: Expect = serde_yaml::from_str(
            "out:\n  contains: Cargo\n  contains_one_of: [nope, src]\n  none_of: [target]\n",
        )
        .unwrap();
        assert!(expect.evaluate(&outcome(0, "Cargo.toml\nsrc\n")).is_empty());

        let failures = expect.evaluate(&outcome(0, "target\n"));
        assert_eq!(failures.len(), 3);
        assert!(failures[0].contains("to contain Cargo"));
        assert!(failures[2].contains("not to contain target"));
    }

    #[test]
    fn test_unknown_assert_field_rejected() {
        assert!(serde_yaml::from_str::<Expect>("out:\n  matches: x\n").is_err());
    }
}
