//! Declarative macros for two-level cost boilerplate.

/// Generates `PartialOrd`, `Add`, `Sub`, `Neg` and the assigning operators
/// for a field-based cost type.
///
/// The constructor must accept fields in the order they are listed.
///
/// # Usage
/// ```ignore
/// impl_cost_ops!(Cost { hard, soft } => of);
/// ```
macro_rules! impl_cost_ops {
    ($type:ident { $($field:ident),+ } => $ctor:ident) => {
        impl PartialOrd for $type {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl std::ops::Add for $type {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                $type::$ctor( $(self.$field + other.$field),+ )
            }
        }

        impl std::ops::Sub for $type {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                $type::$ctor( $(self.$field - other.$field),+ )
            }
        }

        impl std::ops::Neg for $type {
            type Output = Self;

            fn neg(self) -> Self {
                $type::$ctor( $(-self.$field),+ )
            }
        }

        impl std::ops::AddAssign for $type {
            fn add_assign(&mut self, other: Self) {
                $(self.$field += other.$field;)+
            }
        }

        impl std::ops::SubAssign for $type {
            fn sub_assign(&mut self, other: Self) {
                $(self.$field -= other.$field;)+
            }
        }

        impl std::ops::Mul<i64> for $type {
            type Output = Self;

            fn mul(self, factor: i64) -> Self {
                $type::$ctor( $(self.$field * factor),+ )
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold($type::ZERO, |acc, c| acc + c)
            }
        }
    };
}

/// Generates `FromStr` for costs written as `"Xsuffix/Ysuffix"`.
///
/// # Usage
/// ```ignore
/// impl_cost_parse!(Cost { hard => "hard", soft => "soft" } => of);
/// ```
macro_rules! impl_cost_parse {
    ($type:ident { $($field:ident => $suffix:literal),+ } => $ctor:ident) => {
        impl std::str::FromStr for $type {
            type Err = $crate::cost::CostParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let parts: Vec<&str> = s.split('/').collect();
                let suffixes: &[&str] = &[ $($suffix),+ ];

                if parts.len() != suffixes.len() {
                    return Err($crate::cost::CostParseError {
                        message: format!(
                            "Invalid {} format '{}': expected {} parts separated by '/'",
                            stringify!($type), s, suffixes.len()
                        ),
                    });
                }

                let mut _idx = 0usize;
                $(
                    let $field = {
                        let part = parts[_idx].trim();
                        let num_str = part.strip_suffix($suffix).ok_or_else(|| {
                            $crate::cost::CostParseError {
                                message: format!(
                                    "{} part '{}' must end with '{}'",
                                    stringify!($field), part, $suffix
                                ),
                            }
                        })?;
                        let val = num_str.parse::<i64>().map_err(|e| {
                            $crate::cost::CostParseError {
                                message: format!("Invalid {} cost '{}': {}", $suffix, num_str, e),
                            }
                        })?;
                        _idx += 1;
                        val
                    };
                )+

                Ok($type::$ctor( $($field),+ ))
            }
        }
    };
}
