use std::collections::VecDeque;

/// Keeps the last `max_bytes` of tool output, whole lines where possible.
#[derive(Debug)]
pub struct OutputTail {
    lines: VecDeque<String>,
    bytes: usize,
    max_bytes: usize,
}

impl OutputTail {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            bytes: 0,
            max_bytes: max_bytes.max(1),
        }
    }

    pub fn push(&mut self, line: &str) {
        let line = tail_of(line, self.max_bytes);
        self.bytes += line.len() + 1;
        self.lines.push_back(line.to_string());

        while self.bytes > self.max_bytes + 1 {
            match self.lines.pop_front() {
                Some(old) => self.bytes -= old.len() + 1,
                None => break,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contents(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Last `max` bytes of `s`, cut on a char boundary.
fn tail_of(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
