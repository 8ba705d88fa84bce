//! Static reference list backing the country selection in the search form.

/// One selectable country: ISO 3166-1 alpha-2 code plus display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
}

/// Ordered selection options. The form constrains the country field to these
/// codes; the city field stays free text.
pub const COUNTRIES: &[Country] = &[
    Country { code: "US", name: "United States" },
    Country { code: "MX", name: "Mexico" },
    Country { code: "AR", name: "Argentina" },
    Country { code: "CO", name: "Colombia" },
    Country { code: "CR", name: "Costa Rica" },
    Country { code: "ES", name: "Spain" },
    Country { code: "PE", name: "Peru" },
    Country { code: "BR", name: "Brazil" },
    Country { code: "CL", name: "Chile" },
    Country { code: "CA", name: "Canada" },
    Country { code: "GB", name: "United Kingdom" },
    Country { code: "DE", name: "Germany" },
];

impl Country {
    /// Look up a country by code, case-insensitively.
    pub fn by_code(code: &str) -> Option<&'static Country> {
        COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}
