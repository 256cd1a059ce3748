//! Location of a node inside a tagged representation
//!
//! Rendered as the chain of containers walked from the root, e.g.
//! `arr[4].obj.sub-number`. The root itself renders as `$`.

use std::fmt;

#[derive(Debug, Clone)]
enum Segment {
    Index(usize),
    Field(String),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub(crate) fn depth(&self) -> usize {
        self.segments.len()
    }

    pub(crate) fn push_index(&mut self, index: usize) {
        self.segments.push(Segment::Index(index));
    }

    pub(crate) fn push_field(&mut self, name: &str) {
        self.segments.push(Segment::Field(name.to_string()));
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Index(index) => write!(f, "arr[{}]", index)?,
                Segment::Field(name) => write!(f, "obj.{}", name)?,
            }
        }
        Ok(())
    }
}
