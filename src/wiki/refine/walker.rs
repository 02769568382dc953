//! Scoped traversal
//!
//!     A pass usually wants to see every sibling list of the tree, except those belonging to
//!     containers that are parsed as units of their own. The children of an opaque token (a
//!     table, a row, a section) are hidden; their children's children are visited again, so
//!     every cell of a table is reached but the list of rows is not.
//!
//!         Table            <- visible in its parent's list
//!           TableRow       <- hidden (child list of an opaque token)
//!             TableCell    <- hidden (child list of an opaque token)
//!               Text       <- visible: the cell's own list
//!
//!     Traversal uses an explicit stack, so adversarial nesting cannot overflow the call stack.
//!
//!     Passes that rewrite lists get each list taken out of its owner for the duration of the
//!     visit ([walk_mut]). A list is only handed back once everything below it is done, so a
//!     pass never sees an owner whose children are out, and no list is addressed from the root.

use crate::wiki::token::{Kind, Token};

/// Which tokens hide their child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opaque {
    pub kinds: &'static [Kind],
    /// Tag names of [Kind::Tag] tokens that are opaque as well.
    pub tags: &'static [&'static str],
}

impl Opaque {
    /// Tables, rows and sections.
    pub const DEFAULT: Opaque = Opaque {
        kinds: &[Kind::Table, Kind::TableRow, Kind::Section],
        tags: &[],
    };

    pub fn hides(&self, token: &Token) -> bool {
        self.kinds.contains(&token.kind)
            || (token.kind == Kind::Tag
                && token
                    .tagname
                    .as_deref()
                    .is_some_and(|name| self.tags.contains(&name)))
    }
}

/// Lazily yield every visible sibling list below and including `tokens`, in pre-order.
pub fn walk(tokens: &[Token], opaque: Opaque) -> impl Iterator<Item = &[Token]> {
    let mut stack: Vec<(&[Token], bool)> = vec![(tokens, true)];
    std::iter::from_fn(move || {
        while let Some((list, visible)) = stack.pop() {
            for token in list.iter().rev() {
                if !token.children.is_empty() {
                    stack.push((token.children.as_slice(), !opaque.hides(token)));
                }
            }
            if visible {
                return Some(list);
            }
        }
        None
    })
}

/// Depth-first over every sibling list below and including `tokens`, visible or not.
///
/// `label` computes a value from the owner of a list (`root` for `tokens` itself). `enter` sees
/// a list before any list below it, `leave` after all of them. Both may rewrite the list they
/// are given; `enter`'s changes decide which lists are visited below.
pub fn walk_mut<T, L, E, F>(
    tokens: &mut Vec<Token>,
    root: T,
    mut label: L,
    mut enter: E,
    mut leave: F,
) where
    L: FnMut(&Token) -> T,
    E: FnMut(&T, &mut Vec<Token>),
    F: FnMut(&T, &mut Vec<Token>),
{
    struct Frame<T> {
        list: Vec<Token>,
        next: usize,
        label: T,
    }

    let mut list = std::mem::take(tokens);
    enter(&root, &mut list);
    let mut stack = vec![Frame {
        list,
        next: 0,
        label: root,
    }];

    while let Some(top) = stack.last_mut() {
        let below = top.list[top.next..]
            .iter()
            .position(|t| !t.children.is_empty())
            .map(|offset| top.next + offset);
        if let Some(at) = below {
            top.next = at + 1;
            let owner = label(&top.list[at]);
            let mut list = std::mem::take(&mut top.list[at].children);
            enter(&owner, &mut list);
            stack.push(Frame {
                list,
                next: 0,
                label: owner,
            });
            continue;
        }

        let Some(mut done) = stack.pop() else {
            break;
        };
        leave(&done.label, &mut done.list);
        match stack.last_mut() {
            Some(owner) => owner.list[owner.next - 1].children = done.list,
            None => *tokens = done.list,
        }
    }
}

/// Call `f` on every visible sibling list, each after every list below it. Returns the number
/// of lists.
pub fn apply<F>(tokens: &mut Vec<Token>, opaque: Opaque, mut f: F) -> usize
where
    F: FnMut(&mut Vec<Token>),
{
    let mut count = 0;
    walk_mut(
        tokens,
        true,
        |owner| !opaque.hides(owner),
        |_, _| {},
        |visible, list| {
            if *visible {
                f(list);
                count += 1;
            }
        },
    );
    count
}
