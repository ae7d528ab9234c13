use nom::IResult;
use nom::bytes::complete::take_while;
use nom::character::complete::char;
use nom::combinator::all_consuming;
use nom::combinator::opt;
use nom::sequence::delimited;
use nom::sequence::preceded;
use nom::sequence::tuple;

/// The three components of a section marker, borrowed from the line.
/// Absent and empty components are both `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'a> {
    pub name: &'a str,
    pub kind: &'a str,
    pub method: &'a str,
}

impl<'a> Marker<'a> {
    /// Parses a whole line as `[name]`, `[name:type]` or `[name:type:method]`.
    /// Returns `None` for anything else, including a fourth component.
    pub fn parse(line: &'a str) -> Option<Self> {
        marker(line).ok().map(|(_, m)| m)
    }
}

/// Whether a line opens a section and must therefore parse as a marker.
pub fn is_marker(line: &str) -> bool {
    line.starts_with('[')
}

fn component(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c != ':' && c != '[' && c != ']')(input)
}

fn marker(input: &str) -> IResult<&str, Marker<'_>> {
    let (rest, (name, kind, method)) = all_consuming(delimited(
        char('['),
        tuple((
            component,
            opt(preceded(char(':'), component)),
            opt(preceded(char(':'), component)),
        )),
        char(']'),
    ))(input)?;
    Ok((
        rest,
        Marker {
            name,
            kind: kind.unwrap_or_default(),
            method: method.unwrap_or_default(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn bare_name() {
        let m = Marker::parse("[get_user]").unwrap();
        assert_eq!((m.name, m.kind, m.method), ("get_user", "", ""));
    }
    #[test]
    fn name_and_type() {
        let m = Marker::parse("[get_user:preload]").unwrap();
        assert_eq!((m.name, m.kind, m.method), ("get_user", "preload", ""));
    }
    #[test]
    fn empty_type_with_method() {
        let m = Marker::parse("[nums::rows]").unwrap();
        assert_eq!((m.name, m.kind, m.method), ("nums", "", "rows"));
    }
    #[test]
    fn all_empty_components() {
        assert_eq!(Marker::parse("[v2::]"), Marker::parse("[v2]"));
    }
    #[test]
    fn too_many_components() {
        assert!(Marker::parse("[a:b:c:d]").is_none());
    }
    #[test]
    fn unbalanced_brackets() {
        assert!(Marker::parse("[a").is_none());
        assert!(Marker::parse("[a]]").is_none());
        assert!(Marker::parse("[[a]").is_none());
        assert!(Marker::parse("[a] trailing").is_none());
    }
}
