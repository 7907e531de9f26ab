use {
    crate::{
        op::Op,
        parse::{LinkSpec, ParsedChain},
    },
    nalgebra as na,
};

/// Ops a link's mesh receives: its own and all of its ancestors'.
#[derive(Clone, Debug, PartialEq)]
pub struct AccumulatedLink {
    pub link: String,

    /// Every op seen so far, in append order.
    pub ops: Vec<Op>,

    /// Single transform equal to applying `ops` one by one.
    pub composed: na::Isometry3<f32>,
}

/// Running op list for one pass over the chain.
#[derive(Clone, Debug)]
pub struct ChainAccumulator {
    ops: Vec<Op>,
    composed: na::Isometry3<f32>,
}

impl Default for ChainAccumulator {
    fn default() -> Self {
        ChainAccumulator::new()
    }
}

impl ChainAccumulator {
    pub fn new() -> Self {
        ChainAccumulator {
            ops: Vec::new(),
            composed: na::Isometry3::identity(),
        }
    }

    /// Appends link's own ops and snapshots the whole list.
    ///
    /// Composed transform is extended with the new ops only.
    pub fn push(&mut self, spec: &LinkSpec) -> AccumulatedLink {
        for op in &spec.ops {
            self.composed = op.to_iso() * self.composed;
        }
        self.ops.extend_from_slice(&spec.ops);

        AccumulatedLink {
            link: spec.link.clone(),
            ops: self.ops.clone(),
            composed: self.composed,
        }
    }
}

/// Iterator over accumulated links of a parsed chain.
pub struct Accumulate<'a> {
    links: std::slice::Iter<'a, LinkSpec>,
    accumulator: ChainAccumulator,
}

impl Iterator for Accumulate<'_> {
    type Item = AccumulatedLink;

    fn next(&mut self) -> Option<AccumulatedLink> {
        let spec = self.links.next()?;
        Some(self.accumulator.push(spec))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.links.size_hint()
    }
}

impl ExactSizeIterator for Accumulate<'_> {}

pub fn accumulate(chain: &ParsedChain) -> Accumulate<'_> {
    Accumulate {
        links: chain.iter(),
        accumulator: ChainAccumulator::new(),
    }
}
