//! Non-dominated sorting.
//!
//! A population is split into **fronts**: index lists into the population
//! slice, ordered so that no member of front `i` is dominated by a member of
//! any later front, and the members of one front are mutually
//! non-dominated. Fronts are views; they own nothing and are rebuilt every
//! generation.
//!
//! | Function | Purpose |
//! |---|---|
//! | [`sort`] | Incremental insertion sort used by the selector |
//! | [`rank_sort`] | Rank-counting fast non-dominated sort (Deb et al., 2002) |
//! | [`check_fronts`] | Verify the front invariant on any stratification |
//!
//! When dominance is transitive (no near-ties inside the tolerance),
//! [`sort`] and [`rank_sort`] produce the same fronts up to the order of
//! members inside each front, and both satisfy [`check_fronts`].
//!
//! ```
//! use unsga::pareto::{check_fronts, sort};
//! use unsga::{Individual, Layout};
//!
//! let layout = Layout::new(1, 2, 0);
//! let population: Vec<Individual> = [[1.0, 5.0], [5.0, 1.0], [3.0, 3.0], [4.0, 4.0]]
//!     .iter()
//!     .map(|objectives| {
//!         let mut ind = Individual::new(layout);
//!         ind.objectives_mut().copy_from_slice(objectives);
//!         ind
//!     })
//!     .collect();
//!
//! let fronts = sort(&population).unwrap();
//! assert_eq!(fronts, vec![vec![0, 1, 2], vec![3]]);
//! assert!(check_fronts(&population, &fronts).is_ok());
//! ```

use core::fmt;

use crate::dominance::{Dominance, dominate};
use crate::individual::Solution;

/// A detected breach of the sorting invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortAnomaly {
    /// A candidate demoted members of a front and was then found to be
    /// dominated by another member of that same front.
    MisDemotion {
        /// Population index of the inserted candidate.
        candidate: usize,
        /// Front being scanned.
        front: usize,
        /// Members that had already been demoted.
        demoted: Vec<usize>,
    },
    /// Two members of one front dominate each other.
    DominatedWithinFront {
        /// Front index.
        front: usize,
        /// Dominating member.
        dominator: usize,
        /// Dominated member.
        dominated: usize,
    },
    /// A member of a later front dominates a member of an earlier one.
    DominatedByLaterFront {
        /// Front of the dominated member.
        front: usize,
        /// Front of the dominating member.
        later: usize,
        /// Dominating member.
        dominator: usize,
        /// Dominated member.
        dominated: usize,
    },
    /// An individual appears in no front or in more than one.
    Coverage {
        /// Population index.
        index: usize,
        /// How many times it was seen.
        occurrences: usize,
    },
}

impl fmt::Display for SortAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MisDemotion {
                candidate,
                front,
                demoted,
            } => write!(
                f,
                "candidate {candidate} demoted {demoted:?} from front {front} but is dominated within it"
            ),
            Self::DominatedWithinFront {
                front,
                dominator,
                dominated,
            } => write!(
                f,
                "individual {dominator} dominates {dominated} inside front {front}"
            ),
            Self::DominatedByLaterFront {
                front,
                later,
                dominator,
                dominated,
            } => write!(
                f,
                "individual {dominator} in front {later} dominates {dominated} in earlier front {front}"
            ),
            Self::Coverage { index, occurrences } => {
                write!(f, "individual {index} appears in {occurrences} fronts")
            }
        }
    }
}

/// Incremental insertion sort into dominance fronts.
///
/// Individuals are inserted one at a time. For each candidate the fronts
/// are scanned in order; members the candidate dominates are pulled out of
/// the scanned front. If a member dominates the candidate, the scan moves to
/// the next front. The candidate joins the first front where nothing
/// dominates it, or opens a new last front if it is dominated everywhere.
///
/// Pulled-out members are inserted again the same way, starting one front
/// below the one they left, so a demotion can cascade through every deeper
/// front. Each front `k > 0` member stays dominated by some member of front
/// `k - 1`.
///
/// # Errors
///
/// Returns [`SortAnomaly::MisDemotion`] if a candidate is dominated inside a
/// front after it already demoted members of that front. This needs an
/// intransitive dominance relation, which the tie tolerance can produce.
pub fn sort<S: Solution>(population: &[S]) -> Result<Vec<Vec<usize>>, SortAnomaly> {
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    for candidate in 0..population.len() {
        insert(population, &mut fronts, candidate)?;
    }
    Ok(fronts)
}

/// Places `candidate` and re-places everything it transitively demotes.
fn insert<S: Solution>(
    population: &[S],
    fronts: &mut Vec<Vec<usize>>,
    candidate: usize,
) -> Result<(), SortAnomaly> {
    // (individual, first front it may join), processed depth first
    let mut pending = vec![(candidate, 0)];

    while let Some((member, start)) = pending.pop() {
        let mut layer = start;
        loop {
            if layer == fronts.len() {
                fronts.push(vec![member]);
                break;
            }

            let front = &mut fronts[layer];
            let mut demoted = Vec::new();
            let mut dominated = false;
            let mut pos = 0;
            while pos < front.len() {
                match dominate(&population[front[pos]], &population[member]) {
                    Dominance::ADominates => {
                        dominated = true;
                        break;
                    }
                    Dominance::BDominates => demoted.push(front.remove(pos)),
                    Dominance::NonDominated => pos += 1,
                }
            }

            if dominated {
                if !demoted.is_empty() {
                    return Err(SortAnomaly::MisDemotion {
                        candidate: member,
                        front: layer,
                        demoted,
                    });
                }
                layer += 1;
                continue;
            }

            front.push(member);
            pending.extend(demoted.into_iter().rev().map(|d| (d, layer + 1)));
            break;
        }
    }

    Ok(())
}

/// Rank-counting fast non-dominated sort.
///
/// Front `k` holds the individuals with no dominator left once fronts
/// `0..k` are removed. Members of each front keep population order.
///
/// Complexity: O(M * N^2) where M = objectives + constraints, N = population.
#[must_use]
pub fn rank_sort<S: Solution>(population: &[S]) -> Vec<Vec<usize>> {
    let n = population.len();

    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0_usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            match dominate(&population[i], &population[j]) {
                Dominance::ADominates => {
                    dominates[i].push(j);
                    domination_count[j] += 1;
                }
                Dominance::BDominates => {
                    dominates[j].push(i);
                    domination_count[i] += 1;
                }
                Dominance::NonDominated => {}
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &p in &current {
            for &q in &dominates[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next.push(q);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
    }

    fronts
}

/// Checks that `fronts` is a valid stratification of `population`.
///
/// Every individual must appear exactly once, members of a front must be
/// mutually non-dominated, and nothing in a later front may dominate
/// anything in an earlier one.
///
/// # Errors
///
/// Returns the first violation found.
pub fn check_fronts<S: Solution>(population: &[S], fronts: &[Vec<usize>]) -> Result<(), SortAnomaly> {
    let mut seen = vec![0_usize; population.len()];
    for &index in fronts.iter().flatten() {
        if let Some(count) = seen.get_mut(index) {
            *count += 1;
        }
    }
    if let Some((index, &occurrences)) = seen.iter().enumerate().find(|&(_, &count)| count != 1) {
        return Err(SortAnomaly::Coverage { index, occurrences });
    }

    for (fi, front) in fronts.iter().enumerate() {
        for (pos, &a) in front.iter().enumerate() {
            for &b in &front[pos + 1..] {
                match dominate(&population[a], &population[b]) {
                    Dominance::ADominates => {
                        return Err(SortAnomaly::DominatedWithinFront {
                            front: fi,
                            dominator: a,
                            dominated: b,
                        });
                    }
                    Dominance::BDominates => {
                        return Err(SortAnomaly::DominatedWithinFront {
                            front: fi,
                            dominator: b,
                            dominated: a,
                        });
                    }
                    Dominance::NonDominated => {}
                }
            }

            for (later, deeper) in fronts.iter().enumerate().skip(fi + 1) {
                if let Some(&dominator) = deeper.iter().find(|&&b| {
                    dominate(&population[b], &population[a]) == Dominance::ADominates
                }) {
                    return Err(SortAnomaly::DominatedByLaterFront {
                        front: fi,
                        later,
                        dominator,
                        dominated: a,
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::{Individual, Layout};

    fn population(points: &[[f64; 2]]) -> Vec<Individual> {
        let layout = Layout::new(1, 2, 0);
        points
            .iter()
            .map(|p| {
                let mut ind = Individual::new(layout);
                ind.objectives_mut().copy_from_slice(p);
                ind
            })
            .collect()
    }

    #[test]
    fn empty_population_has_no_fronts() {
        assert!(sort::<Individual>(&[]).unwrap().is_empty());
        assert!(rank_sort::<Individual>(&[]).is_empty());
    }

    #[test]
    fn single_individual_is_one_front() {
        let pop = population(&[[1.0, 1.0]]);
        assert_eq!(sort(&pop).unwrap(), vec![vec![0]]);
    }

    #[test]
    fn dominator_first_gives_two_fronts() {
        let pop = population(&[[0.0, 0.0], [1.0, 2.0], [2.0, 1.0]]);
        assert_eq!(sort(&pop).unwrap(), vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn dominator_last_demotes_the_whole_front() {
        let pop = population(&[[1.0, 2.0], [2.0, 1.0], [0.0, 0.0]]);
        assert_eq!(sort(&pop).unwrap(), vec![vec![2], vec![0, 1]]);
    }

    #[test]
    fn dominated_everywhere_opens_last_front() {
        let pop = population(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert_eq!(sort(&pop).unwrap(), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn demoted_member_joins_the_next_front() {
        // 2 is dominated only by 0. Candidate 3 demotes 1, which is
        // incomparable with 2 and joins its front.
        let pop = population(&[[0.0, 3.0], [3.0, 1.0], [0.5, 4.0], [2.0, 0.5]]);
        let fronts = sort(&pop).unwrap();
        assert_eq!(fronts, vec![vec![0, 3], vec![2, 1]]);
        assert!(check_fronts(&pop, &fronts).is_ok());
        assert_eq!(rank_sort(&pop), vec![vec![0, 3], vec![1, 2]]);
    }

    #[test]
    fn demotions_cascade_through_deeper_fronts() {
        // 3 demotes 1 into the front holding 2; 4 is dominated by 0 and by
        // 2 and must land below both.
        let pop = population(&[[0.0, 10.0], [10.0, 0.0], [1.0, 11.0], [9.0, -1.0], [2.0, 12.0]]);
        let fronts = sort(&pop).unwrap();
        assert_eq!(fronts, vec![vec![0, 3], vec![2, 1], vec![4]]);
        assert!(check_fronts(&pop, &fronts).is_ok());
        assert_eq!(rank_sort(&pop), vec![vec![0, 3], vec![1, 2], vec![4]]);
    }

    #[test]
    fn chain_demotion_moves_every_layer_down() {
        // A chain 0 > 1 > 2 inserted worst first, then a new best point.
        let pop = population(&[[2.0, 2.0], [1.0, 1.0], [0.0, 0.0], [-1.0, -1.0]]);
        let fronts = sort(&pop).unwrap();
        assert_eq!(fronts, vec![vec![3], vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn intransitive_ties_report_mis_demotion() {
        let pop = population(&[[1.0, 0.0], [-1.0, 1.6e-6], [0.0, 8e-7]]);
        assert_eq!(
            sort(&pop),
            Err(SortAnomaly::MisDemotion {
                candidate: 2,
                front: 0,
                demoted: vec![0],
            })
        );
    }

    #[test]
    fn check_fronts_rejects_bad_stratifications() {
        let pop = population(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(
            check_fronts(&pop, &[vec![0, 1]]),
            Err(SortAnomaly::DominatedWithinFront { .. })
        ));
        assert!(matches!(
            check_fronts(&pop, &[vec![1], vec![0]]),
            Err(SortAnomaly::DominatedByLaterFront { .. })
        ));
        assert!(matches!(
            check_fronts(&pop, &[vec![0]]),
            Err(SortAnomaly::Coverage {
                index: 1,
                occurrences: 0
            })
        ));
    }

    #[test]
    fn fronts_match_rank_sort_on_grid() {
        let mut points = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                points.push([f64::from(i) + 0.1 * f64::from(j), f64::from((i * 7 + j * 3) % 11)]);
            }
        }
        let pop = population(&points);
        let fronts = sort(&pop).unwrap();
        let oracle = rank_sort(&pop);

        let normalized: Vec<Vec<usize>> = fronts
            .iter()
            .map(|front| {
                let mut front = front.clone();
                front.sort_unstable();
                front
            })
            .collect();
        assert_eq!(normalized, oracle);
        assert!(check_fronts(&pop, &fronts).is_ok());
        assert!(check_fronts(&pop, &oracle).is_ok());
    }
}
