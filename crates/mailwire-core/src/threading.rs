//! Subject normalization and message threading (RFC 5256).
//!
//! Two algorithms: REFERENCES builds parent/child trees from the
//! References and In-Reply-To chains; ORDEREDSUBJECT groups by base
//! subject with the earliest message as the root.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

/// A normalized subject with its stripped-prefix count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSubject {
    /// Lowercased base subject, prefixes and list tags removed.
    pub normalized: String,
    /// Number of reply/forward prefixes stripped.
    pub reply_depth: u32,
}

impl NormalizedSubject {
    /// True when at least one reply/forward prefix was stripped.
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        self.reply_depth > 0
    }
}

/// Normalizes a subject: lowercase, repeatedly strip `re:`/`fwd:`/`fw:`
/// and bracketed mailing-list tags, collapse whitespace.
#[must_use]
pub fn normalize_subject(subject: &str) -> NormalizedSubject {
    let mut rest = subject.trim().to_lowercase();
    let mut reply_depth = 0u32;

    loop {
        let before = rest.len();

        for prefix in ["re:", "fwd:", "fw:"] {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped.trim_start().to_string();
                reply_depth += 1;
            }
        }

        // Mailing-list tag, e.g. "[users] subject".
        if rest.starts_with('[') {
            if let Some(end) = rest.find(']') {
                rest = rest[end + 1..].trim_start().to_string();
            }
        }

        if rest.len() == before {
            break;
        }
    }

    NormalizedSubject {
        normalized: rest.split_whitespace().collect::<Vec<_>>().join(" "),
        reply_depth,
    }
}

/// Input to the threading algorithms.
#[derive(Debug, Clone)]
pub struct ThreadMessage {
    /// Message-ID, angle brackets included.
    pub message_id: String,
    /// References chain, oldest first.
    pub references: Vec<String>,
    /// In-Reply-To, used as the immediate-parent hint.
    pub in_reply_to: Option<String>,
    /// Subject header.
    pub subject: String,
    /// Date header.
    pub date: Option<DateTime<FixedOffset>>,
}

/// One node of a computed thread tree. The index refers into the input
/// slice; container-only nodes (referenced but absent messages) have no
/// index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadedNode {
    /// Index of the message in the input, when present.
    pub message: Option<usize>,
    /// Child nodes, sorted by date.
    pub children: Vec<ThreadedNode>,
}

/// REFERENCES threading (RFC 5256 section 4).
///
/// Builds a container per Message-ID, links each message under its
/// nearest referenced parent, prunes empty containers, and returns the
/// roots in date order.
#[must_use]
pub fn thread_by_references(messages: &[ThreadMessage]) -> Vec<ThreadedNode> {
    // Arena of containers: message index, parent, children.
    struct Container {
        message: Option<usize>,
        parent: Option<usize>,
        children: Vec<usize>,
    }

    let mut arena: Vec<Container> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    let mut container_for = |arena: &mut Vec<Container>, by_id: &mut HashMap<String, usize>, id: &str| -> usize {
        if let Some(&idx) = by_id.get(id) {
            return idx;
        }
        arena.push(Container {
            message: None,
            parent: None,
            children: Vec::new(),
        });
        let idx = arena.len() - 1;
        by_id.insert(id.to_string(), idx);
        idx
    };

    // Pass 1: place each message and wire its reference chain.
    for (index, message) in messages.iter().enumerate() {
        let this = container_for(&mut arena, &mut by_id, &message.message_id);
        // A duplicate Message-ID keeps the first occupant.
        if arena[this].message.is_none() {
            arena[this].message = Some(index);
        }

        // Link the references chain left to right.
        let mut chain: Vec<&str> = message.references.iter().map(String::as_str).collect();
        if let Some(irt) = &message.in_reply_to {
            // In-Reply-To is the authoritative immediate parent hint.
            if chain.last().copied() != Some(irt.as_str()) {
                chain.push(irt.as_str());
            }
        }

        let mut previous: Option<usize> = None;
        for id in &chain {
            let idx = container_for(&mut arena, &mut by_id, id);
            if let Some(prev) = previous {
                if idx != prev && arena[idx].parent.is_none() && !creates_cycle(&arena, idx, prev) {
                    arena[idx].parent = Some(prev);
                    arena[prev].children.push(idx);
                }
            }
            previous = Some(idx);
        }

        // Attach this message under the last element of the chain.
        if let Some(parent) = previous {
            if parent != this && arena[this].parent.is_none() && !creates_cycle(&arena, this, parent)
            {
                arena[this].parent = Some(parent);
                arena[parent].children.push(this);
            }
        }
    }

    fn creates_cycle(arena: &[Container], child: usize, candidate_parent: usize) -> bool {
        let mut current = Some(candidate_parent);
        while let Some(idx) = current {
            if idx == child {
                return true;
            }
            current = arena[idx].parent;
        }
        false
    }

    // Pass 2: recursively realize the tree, pruning empty containers.
    fn realize(
        arena: &[Container],
        messages: &[ThreadMessage],
        idx: usize,
    ) -> Vec<ThreadedNode> {
        let container = &arena[idx];
        let mut children: Vec<ThreadedNode> = container
            .children
            .iter()
            .flat_map(|&c| realize(arena, messages, c))
            .collect();
        sort_by_date(&mut children, messages);

        match container.message {
            Some(message) => vec![ThreadedNode {
                message: Some(message),
                children,
            }],
            // Empty container: promote a lone child, keep a grouping node
            // for several.
            None => match children.len() {
                0 => Vec::new(),
                1 => children,
                _ => vec![ThreadedNode {
                    message: None,
                    children,
                }],
            },
        }
    }

    let mut roots: Vec<ThreadedNode> = (0..arena.len())
        .filter(|&idx| arena[idx].parent.is_none())
        .flat_map(|idx| realize(&arena, messages, idx))
        .collect();

    // Split subject-divergent children off their thread: a child whose
    // normalized subject differs from the root starts its own thread.
    let mut split_off = Vec::new();
    for root in &mut roots {
        if let Some(root_msg) = root.message {
            let root_subject = normalize_subject(&messages[root_msg].subject).normalized;
            let mut kept = Vec::new();
            for child in root.children.drain(..) {
                let diverges = child.message.is_some_and(|m| {
                    normalize_subject(&messages[m].subject).normalized != root_subject
                });
                if diverges {
                    split_off.push(child);
                } else {
                    kept.push(child);
                }
            }
            root.children = kept;
        }
    }
    roots.extend(split_off);

    sort_by_date(&mut roots, messages);
    roots
}

/// ORDEREDSUBJECT threading (RFC 5256 section 4): group by normalized
/// subject; the earliest message roots the group, the rest are flat
/// children in date order.
#[must_use]
pub fn thread_by_ordered_subject(messages: &[ThreadMessage]) -> Vec<ThreadedNode> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, message) in messages.iter().enumerate() {
        let subject = normalize_subject(&message.subject).normalized;
        groups.entry(subject).or_default().push(index);
    }

    let mut roots: Vec<ThreadedNode> = groups
        .into_values()
        .map(|mut indices| {
            indices.sort_by_key(|&i| messages[i].date);
            let root = indices.remove(0);
            ThreadedNode {
                message: Some(root),
                children: indices
                    .into_iter()
                    .map(|i| ThreadedNode {
                        message: Some(i),
                        children: Vec::new(),
                    })
                    .collect(),
            }
        })
        .collect();

    sort_by_date(&mut roots, messages);
    roots
}

/// Sorts sibling nodes by the date of their earliest message.
fn sort_by_date(nodes: &mut [ThreadedNode], messages: &[ThreadMessage]) {
    fn earliest(
        node: &ThreadedNode,
        messages: &[ThreadMessage],
    ) -> Option<DateTime<FixedOffset>> {
        let own = node.message.and_then(|i| messages[i].date);
        node.children
            .iter()
            .filter_map(|c| earliest(c, messages))
            .chain(own)
            .min()
    }
    nodes.sort_by_key(|n| earliest(n, messages));
}
