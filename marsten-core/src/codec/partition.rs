use crate::model::{Context, MarkovModel, Token, Transition};

/// A two-way split of a transition list.
///
/// Drawing from `p0` encodes bit value 1, drawing from `p1` encodes bit value 0.
#[derive(Debug)]
pub struct Partition<'a> {
	/// `true` when `p0` carries close enough to half of the probability mass.
	pub balanced: bool,
	pub p0: Vec<&'a Transition>,
	pub p1: Vec<&'a Transition>,
}

impl<'a> Partition<'a> {
	/// Finds `token` in either half.
	///
	/// Returns the encoded bit and the successor context, or `None` when the
	/// token belongs to neither half.
	pub fn locate(&self, token: Token) -> Option<(bool, &'a Context)> {
		let find = |half: &[&'a Transition]| half.iter().copied().find(|t| t.token == token);
		if let Some(t) = find(&self.p0[..]) {
			return Some((true, &t.next));
		}
		find(&self.p1[..]).map(|t| (false, &t.next))
	}

	/// Half to draw from in order to encode `bit`.
	pub fn half(&self, bit: bool) -> &[&'a Transition] {
		if bit { &self.p0 } else { &self.p1 }
	}
}

/// Splits `transitions` into two halves of roughly equal probability mass.
///
/// Entries are sorted by ascending probability (stable, so equal probabilities
/// keep token order) and dealt alternately: even positions go to `p0`, odd
/// positions to `p1`. The split is balanced when the mass of `p0` falls strictly
/// inside `(0.5 - margin / 2, 0.5 + margin / 2)`.
///
/// Lists with fewer than two entries are never balanced.
pub fn partition(transitions: &[Transition], margin: f64) -> Partition<'_> {
	if transitions.len() < 2 {
		return Partition {
			balanced: false,
			p0: transitions.iter().collect(),
			p1: Vec::new(),
		};
	}

	let mut sorted: Vec<&Transition> = transitions.iter().collect();
	sorted.sort_by(|a, b| a.probability.total_cmp(&b.probability));

	let mut p0 = Vec::with_capacity(sorted.len().div_ceil(2));
	let mut p1 = Vec::with_capacity(sorted.len() / 2);
	for (i, transition) in sorted.into_iter().enumerate() {
		if i % 2 == 0 {
			p0.push(transition);
		} else {
			p1.push(transition);
		}
	}

	let z0: f64 = p0.iter().map(|t| t.probability).sum();
	let balanced = 0.5 - margin / 2.0 < z0 && z0 < 0.5 + margin / 2.0;

	Partition { balanced, p0, p1 }
}

/// Counts the contexts of `model` whose transition list splits into a
/// balanced partition at `margin`.
pub fn balanced_contexts(model: &MarkovModel, margin: f64) -> usize {
	model
		.contexts()
		.filter_map(|context| model.transitions(context).ok())
		.filter(|transitions| partition(transitions, margin).balanced)
		.count()
}
