use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::CorvidError;

/// `host:port` identity of a peer node. Grammar: dotted-quad host, octets 0-255,
/// port 1-65535.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(Arc<String>);

impl NodeId {
    pub fn parse(raw: &str) -> Result<Self, CorvidError> {
        let rgx = Regex::new(r"^([0-9]{1,3})(\.[0-9]{1,3}){3}:([1-9][0-9]{0,4})$").unwrap();
        let caps = match rgx.captures(raw) {
            Some(c) => c,
            None => return Err(CorvidError::InvalidNodeId(raw.to_string())),
        };
        let octets_ok = raw
            .split(':')
            .next()
            .unwrap()
            .split('.')
            .all(|o| o.parse::<u16>().map(|v| v <= 255).unwrap_or(false));
        let port_ok = caps
            .get(3)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(|p| p >= 1 && p <= 65535)
            .unwrap_or(false);
        if !octets_ok || !port_ok {
            return Err(CorvidError::InvalidNodeId(raw.to_string()));
        }
        Ok(NodeId(Arc::new(raw.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A single path segment: `[^/]+`.
pub fn validate_segment(seg: &str) -> Result<(), CorvidError> {
    let rgx = Regex::new(r"^[^/]+$").unwrap();
    if seg.is_empty() || !rgx.is_match(seg) {
        Err(CorvidError::InvalidPath(seg.to_string()))
    } else {
        Ok(())
    }
}

/// Hierarchical name of an actor, optionally prefixed by the `NodeId` it lives on.
/// Two paths are equal iff both the node prefix and the segments are equal.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Path {
    node: Option<NodeId>,
    segments: Arc<Vec<String>>,
}

impl Path {
    pub fn root() -> Self {
        Path {
            node: None,
            segments: Arc::new(Vec::new()),
        }
    }

    /// Parses `/a/b/c` or `host:port/a/b`. The empty path `/` refers to the Guardian.
    pub fn parse(raw: &str) -> Result<Self, CorvidError> {
        let (node, rest) = match raw.find('/') {
            Some(idx) if idx > 0 => {
                let (prefix, rest) = raw.split_at(idx);
                (Some(NodeId::parse(prefix)?), rest)
            }
            Some(_) => (None, raw),
            None => return Err(CorvidError::InvalidPath(raw.to_string())),
        };

        if !rest.starts_with('/') {
            return Err(CorvidError::InvalidPath(raw.to_string()));
        }

        let segments = rest
            .split('/')
            .skip(1)
            .filter(|s| !s.is_empty())
            .map(|s| {
                validate_segment(s)?;
                Ok(s.to_string())
            })
            .collect::<Result<Vec<_>, CorvidError>>()?;

        Ok(Path {
            node,
            segments: Arc::new(segments),
        })
    }

    pub fn child(&self, segment: &str) -> Result<Self, CorvidError> {
        validate_segment(segment)?;
        let mut segments = (*self.segments).clone();
        segments.push(segment.to_string());
        Ok(Path {
            node: self.node.clone(),
            segments: Arc::new(segments),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn node(&self) -> Option<&NodeId> {
        self.node.as_ref()
    }

    pub fn is_remote_to(&self, local: &NodeId) -> bool {
        match &self.node {
            Some(n) => n != local,
            None => false,
        }
    }

    pub fn with_node(&self, node: NodeId) -> Self {
        Path {
            node: Some(node),
            segments: self.segments.clone(),
        }
    }

    pub fn without_node(&self) -> Self {
        Path {
            node: None,
            segments: self.segments.clone(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(node) = &self.node {
            write!(f, "{}", node)?;
        }
        if self.segments.is_empty() {
            write!(f, "/")
        } else {
            for seg in self.segments.iter() {
                write!(f, "/{}", seg)?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Path[{}]", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_grammar() {
        assert!(NodeId::parse("127.0.0.1:8080").is_ok());
        assert!(NodeId::parse("10.0.0.1:1").is_ok());
        assert!(NodeId::parse("10.0.0.1:65535").is_ok());
        assert!(NodeId::parse("256.0.0.1:80").is_err());
        assert!(NodeId::parse("10.0.0.1:0").is_err());
        assert!(NodeId::parse("10.0.0.1:66000").is_err());
        assert!(NodeId::parse("not-an-ip:80").is_err());
    }

    #[test]
    fn path_parse_and_display() {
        let p = Path::parse("/a/b/c").unwrap();
        assert_eq!(p.segments(), &["a", "b", "c"]);
        assert_eq!(format!("{}", p), "/a/b/c");

        let root = Path::parse("/").unwrap();
        assert_eq!(root.segments().len(), 0);
        assert_eq!(format!("{}", root), "/");
    }

    #[test]
    fn remote_path_parse() {
        let p = Path::parse("127.0.0.1:9000/a/b").unwrap();
        assert_eq!(p.node().unwrap().as_str(), "127.0.0.1:9000");
        assert_eq!(p.segments(), &["a", "b"]);
    }

    #[test]
    fn path_equality_includes_node_prefix() {
        let a = Path::parse("/a/b").unwrap();
        let b = Path::parse("127.0.0.1:9000/a/b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn child_extends_segments() {
        let p = Path::root().child("user").unwrap().child("worker-1").unwrap();
        assert_eq!(format!("{}", p), "/user/worker-1");
    }
}
