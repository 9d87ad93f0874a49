use crate::{
    dto::shipping::{RateQuote, RateQuoteList},
    error::{AppError, AppResult},
};

/// Geographic pricing zones, keyed by the numeric prefix of the postal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Capital,
    Metro,
    NearProvinces,
    RestOfCountry,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Capital => "CABA",
            Zone::Metro => "GBA",
            Zone::NearProvinces => "Provincias cercanas",
            Zone::RestOfCountry => "Resto del país",
        }
    }

    fn for_prefix(prefix: u16) -> Zone {
        match prefix {
            1000..=1499 => Zone::Capital,
            1500..=1999 => Zone::Metro,
            2000..=5999 => Zone::NearProvinces,
            _ => Zone::RestOfCountry,
        }
    }

    /// (standard, express) base prices in cents.
    fn base_prices(&self) -> (i64, i64) {
        match self {
            Zone::Capital => (250_000, 450_000),
            Zone::Metro => (320_000, 550_000),
            Zone::NearProvinces => (430_000, 720_000),
            Zone::RestOfCountry => (590_000, 980_000),
        }
    }

    fn estimated_days(&self) -> (&'static str, &'static str) {
        match self {
            Zone::Capital => ("24-48 hs", "24 hs"),
            Zone::Metro => ("2-3 días hábiles", "24-48 hs"),
            Zone::NearProvinces => ("3-6 días hábiles", "2-3 días hábiles"),
            Zone::RestOfCountry => ("5-8 días hábiles", "3-5 días hábiles"),
        }
    }

    fn has_pickup(&self) -> bool {
        matches!(self, Zone::Capital | Zone::Metro)
    }
}

/// Argentine postal code: four digits, optionally prefixed with the province
/// letter ("1050" or "C1050").
pub fn parse_postal_code(raw: &str) -> AppResult<u16> {
    let trimmed = raw.trim();
    let digits = match trimmed.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => &trimmed[1..],
        _ => trimmed,
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "Código postal inválido: {raw}"
        )));
    }
    digits
        .parse::<u16>()
        .map_err(|_| AppError::Validation(format!("Código postal inválido: {raw}")))
}

/// Deterministic rate table lookup. No network calls; same inputs always
/// produce the same quotes.
pub fn quote_rates(postal_code: &str, weight_kg: Option<f64>) -> AppResult<RateQuoteList> {
    let prefix = parse_postal_code(postal_code)?;
    let zone = Zone::for_prefix(prefix);

    let multiplier = match weight_kg {
        None => 1,
        Some(w) if w.is_finite() && w > 0.0 => w.ceil() as i64,
        Some(w) => {
            return Err(AppError::Validation(format!("Peso inválido: {w}")));
        }
    };

    let (standard, express) = zone.base_prices();
    let (standard_eta, express_eta) = zone.estimated_days();

    let mut quotes = Vec::new();
    if zone.has_pickup() {
        quotes.push(RateQuote {
            service: "pickup".into(),
            name: "Retiro en sucursal".into(),
            price: 0,
            estimated_days: "24-72 hs".into(),
        });
    }
    quotes.push(RateQuote {
        service: "standard".into(),
        name: "Envío estándar".into(),
        price: standard * multiplier,
        estimated_days: standard_eta.into(),
    });
    quotes.push(RateQuote {
        service: "express".into(),
        name: "Envío expreso".into(),
        price: express * multiplier,
        estimated_days: express_eta.into(),
    });

    Ok(RateQuoteList {
        zone: zone.label().into(),
        quotes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_price(postal_code: &str, weight: Option<f64>) -> i64 {
        quote_rates(postal_code, weight)
            .unwrap()
            .quotes
            .into_iter()
            .find(|q| q.service == "standard")
            .unwrap()
            .price
    }

    #[test]
    fn lookup_is_deterministic() {
        let a = quote_rates("1050", Some(2.0)).unwrap();
        let b = quote_rates("1050", Some(2.0)).unwrap();
        assert_eq!(a.zone, b.zone);
        assert_eq!(a.quotes, b.quotes);
    }

    #[test]
    fn caba_code_gets_the_lowest_base_tier() {
        let capital = standard_price("1050", None);
        for other in ["1700", "2000", "9999"] {
            assert!(capital < standard_price(other, None), "1050 vs {other}");
        }
    }

    #[test]
    fn far_south_falls_into_rest_of_country() {
        let quoted = quote_rates("9999", None).unwrap();
        assert_eq!(quoted.zone, "Resto del país");
        let rest = standard_price("9999", None);
        for other in ["1050", "1700", "5500"] {
            assert!(rest > standard_price(other, None), "9999 vs {other}");
        }
    }

    #[test]
    fn leading_province_letter_is_accepted() {
        assert_eq!(standard_price("C1050", None), standard_price("1050", None));
    }

    #[test]
    fn malformed_postal_codes_are_rejected() {
        for bad in ["", "105", "10500", "12A4", "AB1234", "C105"] {
            assert!(
                matches!(quote_rates(bad, None), Err(AppError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn weight_scales_by_ceiling_of_kilograms() {
        let base = standard_price("1050", None);
        assert_eq!(standard_price("1050", Some(1.0)), base);
        assert_eq!(standard_price("1050", Some(2.3)), base * 3);
        assert_eq!(standard_price("1050", Some(0.4)), base);
    }

    #[test]
    fn weight_does_not_scale_pickup() {
        let quoted = quote_rates("1050", Some(5.0)).unwrap();
        let pickup = quoted.quotes.iter().find(|q| q.service == "pickup").unwrap();
        assert_eq!(pickup.price, 0);
    }

    #[test]
    fn pickup_only_offered_near_the_capital() {
        assert!(
            quote_rates("1050", None)
                .unwrap()
                .quotes
                .iter()
                .any(|q| q.service == "pickup")
        );
        assert!(
            !quote_rates("9999", None)
                .unwrap()
                .quotes
                .iter()
                .any(|q| q.service == "pickup")
        );
    }

    #[test]
    fn invalid_weight_is_rejected() {
        assert!(matches!(
            quote_rates("1050", Some(-1.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            quote_rates("1050", Some(f64::NAN)),
            Err(AppError::Validation(_))
        ));
    }
}
