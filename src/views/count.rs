//! Renders the aggregate participant count used in count-only mode.

use crate::surface::{CountRow, ListSurface, Placement, Row};

#[derive(Debug, Clone, Copy, Default)]
pub struct CountView;

impl CountView {
    pub fn new() -> Self {
        Self
    }

    /// Replace the count row with one showing `count`.
    pub fn render<S>(&self, surface: &mut S, count: usize)
    where
        S: ListSurface + ?Sized,
    {
        surface.upsert_row(Row::Count(CountRow { count }), Placement::Append);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemorySurface, Scaffold};

    #[test]
    fn test_count_row_is_replaced() {
        let mut surface = MemorySurface::new();
        surface
            .mount(Scaffold {
                container: None,
                classes: vec![],
                options: false,
            })
            .unwrap();

        CountView::new().render(&mut surface, 2);
        CountView::new().render(&mut surface, 3);

        assert_eq!(surface.row_contents(), vec![Row::Count(CountRow { count: 3 })]);
        assert!(surface.to_html().unwrap().contains(r#"data-goinstant-count="3""#));
    }
}
