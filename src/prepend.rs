//! Prepend: a sequence with one extra element in front.

use core::iter::FusedIterator;

/// Yields `head`, then every item of `rest`.
#[derive(Clone, Debug)]
pub struct Prepend<I: Iterator> {
    head: Option<I::Item>,
    rest: I,
}

pub fn prepend<I>(head: I::Item, rest: I) -> Prepend<I::IntoIter>
where
    I: IntoIterator,
{
    Prepend {
        head: Some(head),
        rest: rest.into_iter(),
    }
}

impl<I: Iterator> Iterator for Prepend<I> {
    type Item = I::Item;

    #[inline]
    fn next(&mut self) -> Option<I::Item> {
        match self.head.take() {
            Some(h) => Some(h),
            None => self.rest.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let extra = usize::from(self.head.is_some());
        let (lo, hi) = self.rest.size_hint();
        (
            lo.saturating_add(extra),
            hi.and_then(|h| h.checked_add(extra)),
        )
    }
}

impl<I: DoubleEndedIterator> DoubleEndedIterator for Prepend<I> {
    fn next_back(&mut self) -> Option<I::Item> {
        match self.rest.next_back() {
            Some(x) => Some(x),
            None => self.head.take(),
        }
    }
}

impl<I: ExactSizeIterator> ExactSizeIterator for Prepend<I> {}
impl<I: FusedIterator> FusedIterator for Prepend<I> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_comes_first() {
        let v: Vec<_> = prepend(0, vec![1, 2, 3]).collect();
        assert_eq!(v, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_rest_yields_only_head() {
        let mut it = prepend("h", Vec::<&str>::new());
        assert_eq!(it.len(), 1);
        assert_eq!(it.next(), Some("h"));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn reverse_ends_with_head() {
        let v: Vec<_> = prepend(0, 1..4).rev().collect();
        assert_eq!(v, vec![3, 2, 1, 0]);
        let mut it = prepend(0, 1..3);
        assert_eq!(it.next_back(), Some(2));
        assert_eq!(it.next(), Some(0));
        assert_eq!(it.len(), 1);
        assert_eq!(it.next_back(), Some(1));
        assert_eq!(it.next(), None);
    }
}
