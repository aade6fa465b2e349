/// Kenyan supply season for a calendar month.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Season {
    pub label: &'static str,
    pub multiplier: f64,
}

/// Month-keyed season table. Dry season lifts prices (supply pressure), the
/// cold and rainy months depress them (glut); both rains seasons are neutral.
pub fn season_of(month: u32) -> Season {
    match month {
        12 | 1 | 2 => Season { label: "Dry Season", multiplier: 1.15 },
        6 | 7 | 8 => Season { label: "Cold / Rainy", multiplier: 0.90 },
        3 | 4 | 5 => Season { label: "Long Rains", multiplier: 1.00 },
        _ => Season { label: "Short Rains", multiplier: 1.00 },
    }
}

#[cfg(test)]
mod tests {
    use super::season_of;

    #[test]
    fn dry_season_months_carry_the_premium() {
        for month in [12, 1, 2] {
            let season = season_of(month);
            assert_eq!(season.label, "Dry Season");
            assert_eq!(season.multiplier, 1.15);
        }
    }

    #[test]
    fn cold_rainy_months_are_discounted() {
        for month in [6, 7, 8] {
            let season = season_of(month);
            assert_eq!(season.label, "Cold / Rainy");
            assert_eq!(season.multiplier, 0.90);
        }
    }

    #[test]
    fn both_rains_seasons_are_neutral() {
        for month in [3, 4, 5] {
            assert_eq!(season_of(month).label, "Long Rains");
            assert_eq!(season_of(month).multiplier, 1.00);
        }
        for month in [9, 10, 11] {
            assert_eq!(season_of(month).label, "Short Rains");
            assert_eq!(season_of(month).multiplier, 1.00);
        }
    }
}
