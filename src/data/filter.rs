use std::collections::BTreeSet;

use super::model::{SaleRecord, SalesTable};

// ---------------------------------------------------------------------------
// Selection values: what the sidebar widgets currently say
// ---------------------------------------------------------------------------

/// Which genres pass the filter.
///
/// An empty widget selection means **every** genre, never none. Build this
/// from widget state with [`GenreSelection::from_selected`] so that rule is
/// applied in one place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenreSelection {
    All,
    Only(BTreeSet<String>),
}

impl GenreSelection {
    /// Map the genres ticked in the UI to a selection. Nothing ticked → `All`.
    pub fn from_selected(selected: BTreeSet<String>) -> Self {
        if selected.is_empty() {
            GenreSelection::All
        } else {
            GenreSelection::Only(selected)
        }
    }

    pub fn matches(&self, genre: &str) -> bool {
        match self {
            GenreSelection::All => true,
            GenreSelection::Only(genres) => genres.contains(genre),
        }
    }
}

/// Closed price interval; both bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Build a range, swapping reversed bounds.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            PriceRange { min: a, max: b }
        } else {
            PriceRange { min: b, max: a }
        }
    }

    /// The range spanning every price in `table` (`[0, 0]` when empty).
    pub fn covering(table: &SalesTable) -> Self {
        let (min, max) = table.price_bounds().unwrap_or((0.0, 0.0));
        PriceRange { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

/// The discount radio on the Sales page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiscountFilter {
    #[default]
    AllProducts,
    DiscountedOnly,
}

impl DiscountFilter {
    pub fn matches(&self, record: &SaleRecord) -> bool {
        match self {
            DiscountFilter::AllProducts => true,
            DiscountFilter::DiscountedOnly => record.is_discounted(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiscountFilter::AllProducts => "All products",
            DiscountFilter::DiscountedOnly => "Discounted only",
        }
    }
}

/// Dashboard page a selection is built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Sales,
    Ratings,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Sales => "Sales",
            View::Ratings => "Ratings",
        }
    }
}

/// An immutable filter request. Build a fresh one for every widget change.
///
/// The two variants are the two filter modes: the ratings view has no
/// discount widget, so its selection carries no discount predicate at all.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterSelection {
    /// Genre and price predicates.
    GenreAndPrice {
        genres: GenreSelection,
        price: PriceRange,
    },
    /// Genre, price and discount predicates.
    WithDiscount {
        genres: GenreSelection,
        price: PriceRange,
        discount: DiscountFilter,
    },
}

impl FilterSelection {
    /// The "everything visible" selection for a freshly loaded table.
    pub fn for_view(view: View, table: &SalesTable) -> Self {
        let genres = GenreSelection::All;
        let price = PriceRange::covering(table);
        match view {
            View::Sales => FilterSelection::WithDiscount {
                genres,
                price,
                discount: DiscountFilter::AllProducts,
            },
            View::Ratings => FilterSelection::GenreAndPrice { genres, price },
        }
    }

    /// Whether a single record passes every predicate of this selection.
    pub fn matches(&self, record: &SaleRecord) -> bool {
        match self {
            FilterSelection::GenreAndPrice { genres, price } => {
                genres.matches(&record.genre) && price.contains(record.price)
            }
            FilterSelection::WithDiscount {
                genres,
                price,
                discount,
            } => {
                genres.matches(&record.genre)
                    && price.contains(record.price)
                    && discount.matches(record)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Return indices of records that pass the selection, in table order.
pub fn filtered_indices(table: &SalesTable, selection: &FilterSelection) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| selection.matches(record))
        .map(|(i, _)| i)
        .collect()
}

/// Return a new table holding the records that pass the selection.
///
/// The input is never modified. An empty result means "no records match"
/// and is not an error.
pub fn filter_table(table: &SalesTable, selection: &FilterSelection) -> SalesTable {
    let records: Vec<SaleRecord> = filtered_indices(table, selection)
        .into_iter()
        .map(|i| table.records[i].clone())
        .collect();
    log::debug!("Filter kept {} of {} rows", records.len(), table.len());
    SalesTable::from_records(table.columns.clone(), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sale(id: &str, genre: &str, price: f64, discount: f64) -> SaleRecord {
        SaleRecord {
            order_id: Some(id.to_string()),
            genre: genre.to_string(),
            price,
            rating: None,
            discount: Some(discount),
            sale_date: None,
            extra: BTreeMap::new(),
        }
    }

    fn table(records: Vec<SaleRecord>) -> SalesTable {
        SalesTable::from_records(
            vec![
                "order_id".into(),
                "genre_desc".into(),
                "price".into(),
                "discount".into(),
            ],
            records,
        )
    }

    fn three_rows() -> SalesTable {
        table(vec![
            sale("1", "Romance", 10.0, 0.1),
            sale("2", "Romance", 25.0, 0.0),
            sale("3", "Mystery", 10.0, 0.0),
        ])
    }

    fn genres(names: &[&str]) -> GenreSelection {
        GenreSelection::from_selected(names.iter().map(|s| s.to_string()).collect())
    }

    fn ids(table: &SalesTable) -> Vec<&str> {
        table
            .records
            .iter()
            .filter_map(|r| r.order_id.as_deref())
            .collect()
    }

    #[test]
    fn romance_under_twenty_with_discount() {
        let selection = FilterSelection::WithDiscount {
            genres: genres(&["Romance"]),
            price: PriceRange::new(0.0, 20.0),
            discount: DiscountFilter::DiscountedOnly,
        };
        let result = filter_table(&three_rows(), &selection);
        assert_eq!(ids(&result), vec!["1"]);
        assert_eq!(result.records[0], three_rows().records[0]);
    }

    #[test]
    fn empty_genre_selection_means_all() {
        let t = three_rows();
        assert_eq!(genres(&[]), GenreSelection::All);

        let (min, max) = t.price_bounds().unwrap();
        let selection = FilterSelection::GenreAndPrice {
            genres: genres(&[]),
            price: PriceRange::new(min, max),
        };
        assert_eq!(filter_table(&t, &selection), t);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let selection = FilterSelection::WithDiscount {
            genres: GenreSelection::All,
            price: PriceRange::new(10.0, 25.0),
            discount: DiscountFilter::AllProducts,
        };
        assert_eq!(ids(&filter_table(&three_rows(), &selection)), vec!["1", "2", "3"]);

        let upper_only = FilterSelection::GenreAndPrice {
            genres: GenreSelection::All,
            price: PriceRange::new(25.0, 30.0),
        };
        assert_eq!(ids(&filter_table(&three_rows(), &upper_only)), vec!["2"]);
    }

    #[test]
    fn discounted_only_drops_zero_and_missing_discounts() {
        let mut rows = three_rows().records;
        let mut missing = sale("4", "Mystery", 12.0, 0.0);
        missing.discount = None;
        rows.push(missing);
        rows.push(sale("5", "Mystery", 12.0, -0.1));
        let t = table(rows);

        let selection = FilterSelection::WithDiscount {
            genres: GenreSelection::All,
            price: PriceRange::covering(&t),
            discount: DiscountFilter::DiscountedOnly,
        };
        let result = filter_table(&t, &selection);
        assert!(result.records.iter().all(|r| r.discount.unwrap_or(0.0) > 0.0));
        assert_eq!(ids(&result), vec!["1"]);
    }

    #[test]
    fn ratings_mode_never_filters_on_discount() {
        let t = three_rows();
        let selection = FilterSelection::for_view(View::Ratings, &t);
        assert!(matches!(selection, FilterSelection::GenreAndPrice { .. }));
        assert_eq!(filter_table(&t, &selection).len(), 3);
    }

    #[test]
    fn sales_defaults_show_everything() {
        let t = three_rows();
        let selection = FilterSelection::for_view(View::Sales, &t);
        assert_eq!(
            selection,
            FilterSelection::WithDiscount {
                genres: GenreSelection::All,
                price: PriceRange { min: 10.0, max: 25.0 },
                discount: DiscountFilter::AllProducts,
            }
        );
        assert_eq!(filter_table(&t, &selection), t);
    }

    #[test]
    fn filtering_is_idempotent_and_order_preserving() {
        let t = table(vec![
            sale("a", "Mystery", 8.0, 0.2),
            sale("b", "Romance", 14.0, 0.0),
            sale("c", "Mystery", 30.0, 0.3),
            sale("d", "Poetry", 9.0, 0.1),
            sale("e", "Mystery", 11.0, 0.05),
        ]);
        let selection = FilterSelection::WithDiscount {
            genres: genres(&["Mystery", "Poetry"]),
            price: PriceRange::new(20.0, 5.0),
            discount: DiscountFilter::DiscountedOnly,
        };

        let once = filter_table(&t, &selection);
        let twice = filter_table(&once, &selection);
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec!["a", "d", "e"]);

        // Sub-sequence of the input, in original relative order.
        let positions: Vec<usize> = once
            .records
            .iter()
            .map(|r| t.records.iter().position(|o| o == r).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(filtered_indices(&t, &selection), positions);
    }

    #[test]
    fn input_table_is_untouched_and_results_are_deterministic() {
        let t = three_rows();
        let before = t.clone();
        let selection = FilterSelection::GenreAndPrice {
            genres: genres(&["Mystery"]),
            price: PriceRange::new(0.0, 100.0),
        };
        let a = filter_table(&t, &selection);
        let b = filter_table(&t, &selection);
        assert_eq!(a, b);
        assert_eq!(t, before);
    }

    #[test]
    fn no_match_yields_an_empty_table_with_the_same_columns() {
        let t = three_rows();
        let selection = FilterSelection::GenreAndPrice {
            genres: genres(&["Poetry"]),
            price: PriceRange::covering(&t),
        };
        let result = filter_table(&t, &selection);
        assert!(result.is_empty());
        assert_eq!(result.columns, t.columns);
        assert!(result.genres.is_empty());
    }
}
