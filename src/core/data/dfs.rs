use std::fmt;

/// A closed path through a graph. The first and last nodes of the path are the same.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cycle<T> {
    path: Vec<T>,
}

impl<T> Cycle<T> {
    pub fn path(&self) -> &[T] {
        &self.path
    }

    /// The distinct nodes of the cycle, in path order.
    pub fn members(&self) -> &[T] {
        match self.path.len() {
            0 => &self.path,
            len => &self.path[..len - 1],
        }
    }

    pub fn contains(&self, node: &T) -> bool
    where
        T: PartialEq,
    {
        self.path.contains(node)
    }

    pub fn map<U, F>(self, f: F) -> Cycle<U>
    where
        F: FnMut(T) -> U,
    {
        Cycle {
            path: self.path.into_iter().map(f).collect(),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Cycle<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, node) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct Frame {
    node: usize,
    successors: Vec<usize>,
    next: usize,
}

impl Frame {
    fn enter(node: usize, successors: Vec<usize>) -> Self {
        Frame {
            node,
            successors,
            next: 0,
        }
    }
}

/// Finds cycles in the graph with nodes `0..node_count`, using a three-colour depth-first search
/// started from every node not visited yet, in index order.
///
/// Reaching a node on the current path closes a cycle. The cycle is reported once, its members
/// are not explored again, and the remaining successors of the current node are skipped.
/// Successors out of range are ignored.
pub fn find_cycles<F>(node_count: usize, mut successors: F) -> Vec<Cycle<usize>>
where
    F: FnMut(usize) -> Vec<usize>,
{
    let mut colors = vec![Color::White; node_count];
    let mut cycles: Vec<Cycle<usize>> = Vec::new();

    for root in 0..node_count {
        if colors[root] != Color::White {
            continue;
        }

        colors[root] = Color::Gray;
        let mut stack: Vec<Frame> = vec![Frame::enter(root, successors(root))];

        loop {
            let next = match stack.last_mut() {
                None => break,
                Some(frame) => {
                    if frame.next < frame.successors.len() {
                        frame.next += 1;
                        Some(frame.successors[frame.next - 1])
                    } else {
                        None
                    }
                }
            };

            let succ = match next {
                Some(succ) => succ,
                None => {
                    if let Some(frame) = stack.pop() {
                        colors[frame.node] = Color::Black;
                    }
                    continue;
                }
            };

            if succ >= node_count {
                continue;
            }

            match colors[succ] {
                Color::White => {
                    colors[succ] = Color::Gray;
                    let frame = Frame::enter(succ, successors(succ));
                    stack.push(frame);
                }
                Color::Gray => {
                    let start = stack
                        .iter()
                        .position(|frame| frame.node == succ)
                        .unwrap_or(0);
                    let mut path: Vec<usize> =
                        stack[start..].iter().map(|frame| frame.node).collect();
                    path.push(succ);

                    for &member in &path {
                        colors[member] = Color::Black;
                    }
                    if let Some(frame) = stack.last_mut() {
                        frame.next = frame.successors.len();
                    }

                    debug!("Found cycle through nodes {:?}", path);
                    cycles.push(Cycle { path });
                }
                Color::Black => {}
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: Vec<Vec<usize>>) -> impl FnMut(usize) -> Vec<usize> {
        move |node| edges[node].clone()
    }

    #[test]
    fn self_loop() {
        //exercise
        let cycles = find_cycles(1, graph(vec![vec![0]]));

        //verify
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path(), &[0, 0]);
        assert_eq!(cycles[0].members(), &[0]);
    }

    #[test]
    fn acyclic() {
        //setup
        let edges = vec![vec![1, 2], vec![2], vec![], vec![0, 2]];

        //exercise
        let cycles = find_cycles(4, graph(edges));

        //verify
        assert!(cycles.is_empty());
    }

    #[test]
    fn cycle_path_starts_at_repeated_node() {
        //setup
        let edges = vec![vec![1], vec![2], vec![3], vec![1]];

        //exercise
        let cycles = find_cycles(4, graph(edges));

        //verify
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path(), &[1, 2, 3, 1]);
        assert!(!cycles[0].contains(&0));
    }

    #[test]
    fn independent_cycles() {
        //setup
        let edges = vec![vec![1], vec![0], vec![3], vec![2, 4], vec![]];

        //exercise
        let cycles = find_cycles(5, graph(edges));

        //verify
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].path(), &[0, 1, 0]);
        assert_eq!(cycles[1].path(), &[2, 3, 2]);
    }

    #[test]
    fn finished_nodes_do_not_stop_siblings() {
        //setup
        let edges = vec![vec![2], vec![2, 3], vec![], vec![1]];

        //exercise
        let cycles = find_cycles(4, graph(edges));

        //verify
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path(), &[1, 3, 1]);
    }

    #[test]
    fn out_of_range_successors_are_ignored() {
        //exercise
        let cycles = find_cycles(2, graph(vec![vec![7, 1], vec![]]));

        //verify
        assert!(cycles.is_empty());
    }

    #[test]
    fn display_and_map() {
        //setup
        let cycles = find_cycles(2, graph(vec![vec![1], vec![0]]));
        let names = ["Foo", "Bar"];

        //exercise
        let named = cycles[0].clone().map(|node| names[node]);

        //verify
        assert_eq!(named.to_string(), "Foo -> Bar -> Foo");
    }
}
