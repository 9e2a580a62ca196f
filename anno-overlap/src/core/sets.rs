use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use std::cmp::Reverse;

/// subsets are enumerated explicitly, so the group size is bounded
pub const MAX_COMBINED_TOOLS: usize = 16;

#[derive(Debug, Error, PartialEq)]
pub enum OverlapError {
    #[error("unknown tool in comparison: {0}")]
    UnknownTool(String),
    #[error("{0} tools requested, at most {} can be combined", MAX_COMBINED_TOOLS)]
    TooManyTools(usize),
}

/// statistics of one non-empty subset of tools
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Combination {
    pub tools: Vec<String>,
    /// genes annotated by every tool of the subset
    pub intersection: usize,
    /// genes annotated by any tool of the subset
    pub union: usize,
    /// genes annotated by exactly these tools and no other compared tool
    pub exclusive: usize,
}

/// named annotated-gene sets, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct GeneSets {
    names: Vec<String>,
    sets: Vec<HashSet<String>>,
}

impl GeneSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// add a set, or extend the set already registered under `name`
    pub fn insert(&mut self, name: &str, genes: HashSet<String>) {
        match self.names.iter().position(|n| n == name) {
            Some(idx) => self.sets[idx].extend(genes),
            None => {
                self.names.push(name.to_string());
                self.sets.push(genes);
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&HashSet<String>> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.sets[idx])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn indices(&self, group: &[&str]) -> Result<Vec<usize>, OverlapError> {
        let mut indices = Vec::with_capacity(group.len());
        for tool in group {
            let idx = self
                .names
                .iter()
                .position(|n| n == *tool)
                .ok_or_else(|| OverlapError::UnknownTool(tool.to_string()))?;

            if !indices.contains(&idx) {
                indices.push(idx);
            }
        }

        Ok(indices)
    }

    pub fn union(&self, group: &[&str]) -> Result<HashSet<String>, OverlapError> {
        let indices = self.indices(group)?;
        Ok(indices
            .iter()
            .flat_map(|idx| self.sets[*idx].iter().cloned())
            .collect())
    }

    /// empty for an empty group
    pub fn intersection(&self, group: &[&str]) -> Result<HashSet<String>, OverlapError> {
        let indices = self.indices(group)?;
        let Some((first, rest)) = indices.split_first() else {
            return Ok(HashSet::new());
        };

        Ok(self.sets[*first]
            .iter()
            .filter(|gene| rest.iter().all(|idx| self.sets[*idx].contains(*gene)))
            .cloned()
            .collect())
    }

    /// genes of `tool` absent from every other tool of `group`
    pub fn unique(&self, tool: &str, group: &[&str]) -> Result<HashSet<String>, OverlapError> {
        let own = self.indices(&[tool])?[0];
        let others = self
            .indices(group)?
            .into_iter()
            .filter(|idx| *idx != own)
            .collect::<Vec<_>>();

        Ok(self.sets[own]
            .iter()
            .filter(|gene| !others.iter().any(|idx| self.sets[*idx].contains(*gene)))
            .cloned()
            .collect())
    }

    /// membership histogram: bit i of a key is set when group[i] annotates
    /// the gene; the value counts genes with exactly that membership
    pub fn regions(&self, group: &[&str]) -> Result<HashMap<u32, usize>, OverlapError> {
        let indices = self.indices(group)?;
        if indices.len() > MAX_COMBINED_TOOLS {
            return Err(OverlapError::TooManyTools(indices.len()));
        }

        let genes = indices
            .iter()
            .flat_map(|idx| self.sets[*idx].iter())
            .collect::<HashSet<_>>();

        Ok(genes
            .par_iter()
            .fold(HashMap::new, |mut acc: HashMap<u32, usize>, gene| {
                let mask = indices
                    .iter()
                    .enumerate()
                    .filter(|(_, idx)| self.sets[**idx].contains(*gene))
                    .fold(0u32, |mask, (bit, _)| mask | (1 << bit));
                *acc.entry(mask).or_default() += 1;
                acc
            })
            .reduce(HashMap::new, |mut a, b| {
                for (mask, count) in b {
                    *a.entry(mask).or_default() += count;
                }
                a
            }))
    }

    /// every non-empty subset of `group`, accumulated from the membership
    /// histogram: a region counts toward a subset's intersection when it
    /// covers the subset, and toward its union when it touches it
    pub fn combinations(&self, group: &[&str]) -> Result<Vec<Combination>, OverlapError> {
        let regions = self.regions(group)?;
        let indices = self.indices(group)?;
        let n = indices.len();

        let mut combinations = (1u32..(1u32 << n))
            .into_par_iter()
            .map(|subset| {
                let mut combination = Combination {
                    tools: (0..n)
                        .filter(|bit| subset & (1 << bit) != 0)
                        .map(|bit| self.names[indices[bit]].clone())
                        .collect(),
                    intersection: 0,
                    union: 0,
                    exclusive: 0,
                };

                for (mask, count) in regions.iter() {
                    if mask & subset == subset {
                        combination.intersection += count;
                    }
                    if mask & subset != 0 {
                        combination.union += count;
                    }
                    if *mask == subset {
                        combination.exclusive += count;
                    }
                }

                (subset.count_ones(), subset, combination)
            })
            .collect::<Vec<_>>();

        combinations.sort_by_key(|(size, subset, _)| (*size, Reverse(subset.reverse_bits())));
        Ok(combinations.into_iter().map(|(_, _, c)| c).collect())
    }
}
