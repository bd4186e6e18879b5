use std::cmp::Ordering;

/// A single comparable piece of a version string.
///
/// Numbers are kept as their decimal digits with leading zeros removed, so
/// arbitrarily long runs still compare numerically. Zero is the empty string.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Number(String),
    Text(String),
}

impl Segment {
    fn zero() -> Segment {
        Segment::Number(String::new())
    }

    fn is_zero(&self) -> bool {
        matches!(self, Segment::Number(digits) if digits.is_empty())
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Gem style version: `1.2.0-beta` reads as `1.2.0.pre.beta`, any textual
/// segment marks a pre-release and trailing zeros are insignificant.
#[derive(Clone, Debug)]
pub(crate) struct Version {
    segments: Vec<Segment>,
}

impl Version {
    pub(crate) fn parse(tag: &str) -> Version {
        let mut segments = vec![];
        let mut chars = tag.chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                segments.push(Segment::Number(digits.trim_start_matches('0').to_string()));
            } else if c.is_alphabetic() {
                let mut text = String::new();
                while let Some(&t) = chars.peek() {
                    if !t.is_alphabetic() {
                        break;
                    }
                    text.push(t);
                    chars.next();
                }
                segments.push(Segment::Text(text));
            } else {
                if c == '-' {
                    segments.push(Segment::Text("pre".to_string()));
                }
                chars.next();
            }
        }

        Version {
            segments: canonicalize(segments),
        }
    }
}

fn trim_zeros(mut segments: Vec<Segment>) -> Vec<Segment> {
    while segments.last().is_some_and(Segment::is_zero) {
        segments.pop();
    }
    segments
}

fn canonicalize(mut segments: Vec<Segment>) -> Vec<Segment> {
    let split = segments
        .iter()
        .position(|s| matches!(s, Segment::Text(_)))
        .unwrap_or(segments.len());

    let prerelease = segments.split_off(split);
    let mut canonical = trim_zeros(segments);
    canonical.extend(trim_zeros(prerelease));
    canonical
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let limit = self.segments.len().max(other.segments.len());
        let zero = Segment::zero();

        for idx in 0..limit {
            let lhs = self.segments.get(idx).unwrap_or(&zero);
            let rhs = other.segments.get(idx).unwrap_or(&zero);

            match lhs.cmp(rhs) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }

        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

fn is_version_like(tag: &str) -> bool {
    tag.chars().any(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

/// Orders tags ascending by version. Tags that don't look like versions at
/// all are appended afterwards in their original order.
///
/// Tags that are equal as versions (`1.0` and `1.0.0`) fall back to plain
/// string ordering, so the result never depends on the input order.
pub(crate) fn sort_versions(tags: &[String]) -> Vec<String> {
    let (mut versions, others): (Vec<&String>, Vec<&String>) =
        tags.iter().partition(|tag| is_version_like(tag));

    versions.sort_by_cached_key(|tag| (Version::parse(tag), tag.to_string()));

    versions.into_iter().chain(others).cloned().collect()
}
