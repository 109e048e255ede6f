use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A person and a point in time, as recorded on the `author` and
/// `committer` lines of a commit.
///
/// Canonical text form: `name <email> seconds ±HHMM`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    name: String,
    email: String,
    /// Unix timestamp in seconds.
    timestamp: i64,
    /// Offset from UTC in minutes (e.g. `+0130` is 90).
    tz_offset_minutes: i32,
}

impl Identity {
    /// Create an identity, rejecting names and emails that would break the
    /// line-oriented commit encoding.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: i64,
        tz_offset_minutes: i32,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        let email = email.into();
        for (field, value) in [("name", &name), ("email", &email)] {
            if value.contains(['<', '>', '\n', '\0']) {
                return Err(TypeError::InvalidIdentity(format!(
                    "{field} contains a reserved character: {value:?}"
                )));
            }
        }
        if tz_offset_minutes.abs() >= 100 * 60 {
            return Err(TypeError::InvalidIdentity(format!(
                "timezone offset out of range: {tz_offset_minutes} minutes"
            )));
        }
        Ok(Self {
            name,
            email,
            timestamp,
            tz_offset_minutes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn tz_offset_minutes(&self) -> i32 {
        self.tz_offset_minutes
    }

    /// Timezone offset rendered as `±HHMM`.
    pub fn tz_offset(&self) -> String {
        let sign = if self.tz_offset_minutes < 0 { '-' } else { '+' };
        let abs = self.tz_offset_minutes.abs();
        format!("{sign}{:02}{:02}", abs / 60, abs % 60)
    }

    fn parse_tz(s: &str) -> Result<i32, TypeError> {
        let bad = || TypeError::InvalidIdentity(format!("invalid timezone offset: {s:?}"));
        let (sign, digits) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return Err(bad()),
        };
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let hours: i32 = digits[..2].parse().map_err(|_| bad())?;
        let minutes: i32 = digits[2..].parse().map_err(|_| bad())?;
        if minutes >= 60 {
            return Err(bad());
        }
        Ok(sign * (hours * 60 + minutes))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp,
            self.tz_offset()
        )
    }
}

impl FromStr for Identity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ' ');
        let (Some(tz), Some(secs), Some(person)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(TypeError::InvalidIdentity(format!("too few fields: {s:?}")));
        };

        let timestamp: i64 = secs
            .parse()
            .map_err(|_| TypeError::InvalidIdentity(format!("invalid timestamp: {secs:?}")))?;
        let tz_offset_minutes = Self::parse_tz(tz)?;

        let person = person
            .strip_suffix('>')
            .ok_or_else(|| TypeError::InvalidIdentity(format!("missing '>' in {person:?}")))?;
        let open = person
            .rfind('<')
            .ok_or_else(|| TypeError::InvalidIdentity(format!("missing '<' in {person:?}")))?;
        let name = person[..open].strip_suffix(' ').unwrap_or(&person[..open]);
        let email = &person[open + 1..];

        Self::new(name, email, timestamp, tz_offset_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let id = Identity::new("Ada Lovelace", "ada@example.com", 1_700_000_000, 60).unwrap();
        assert_eq!(id.to_string(), "Ada Lovelace <ada@example.com> 1700000000 +0100");
    }

    #[test]
    fn negative_offset_display() {
        let id = Identity::new("a", "a@b", 0, -(5 * 60 + 30)).unwrap();
        assert_eq!(id.tz_offset(), "-0530");
    }

    #[test]
    fn parse_roundtrip() {
        let text = "Grace Hopper <grace@navy.mil> 946684800 -0500";
        let id: Identity = text.parse().unwrap();
        assert_eq!(id.name(), "Grace Hopper");
        assert_eq!(id.email(), "grace@navy.mil");
        assert_eq!(id.timestamp(), 946_684_800);
        assert_eq!(id.tz_offset_minutes(), -300);
        assert_eq!(id.to_string(), text);
    }

    #[test]
    fn parse_rejects_missing_email_brackets() {
        assert!("someone someone@example.com 0 +0000".parse::<Identity>().is_err());
    }

    #[test]
    fn parse_rejects_bad_timezone() {
        assert!("a <a@b> 0 0000".parse::<Identity>().is_err());
        assert!("a <a@b> 0 +0075".parse::<Identity>().is_err());
        assert!("a <a@b> 0 +01".parse::<Identity>().is_err());
    }

    #[test]
    fn parse_rejects_bad_timestamp() {
        assert!("a <a@b> yesterday +0000".parse::<Identity>().is_err());
    }

    #[test]
    fn new_rejects_reserved_characters() {
        assert!(Identity::new("a\nb", "a@b", 0, 0).is_err());
        assert!(Identity::new("a", "<a@b>", 0, 0).is_err());
    }
}
