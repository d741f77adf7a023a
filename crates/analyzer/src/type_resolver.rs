// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Type node resolution

use relsql_ast::{DataType, Length};
use relsql_ir::Type;

use crate::context::AnalyzerContext;
use crate::error::{AnalyzerResult, DiagnosticCode};

fn string_length(
    context: &mut AnalyzerContext,
    varying: bool,
    length: Option<Length>,
) -> AnalyzerResult<Option<u32>> {
    match (varying, length) {
        (false, None) => Ok(Some(1)),
        (true, None) | (true, Some(Length::Flexible)) => Ok(None),
        (false, Some(Length::Flexible)) => Err(context.report(
            DiagnosticCode::FlexibleLengthIsNotSupported,
            None,
            "fixed-length types require an explicit length",
        )),
        (_, Some(Length::Value(0))) => Err(context.report(
            DiagnosticCode::InvalidTypeLength,
            None,
            "type length must be positive",
        )),
        (_, Some(Length::Value(n))) => Ok(Some(n)),
    }
}

fn decimal(
    context: &mut AnalyzerContext,
    precision: Option<Length>,
    scale: Option<Length>,
) -> AnalyzerResult<Type> {
    let max = context.options().max_decimal_precision;
    let precision = match precision {
        None => context.options().default_decimal_precision,
        Some(Length::Flexible) => None,
        Some(Length::Value(p)) => Some(p),
    };
    let scale = match scale {
        None => Some(context.options().default_decimal_scale.unwrap_or(0)),
        Some(Length::Flexible) => None,
        Some(Length::Value(s)) => Some(s),
    };

    let Some(precision) = precision else {
        return Ok(Type::FLEXIBLE_DECIMAL);
    };
    if precision == 0 || precision > max {
        return Err(context.report(
            DiagnosticCode::InvalidNumericPrecision,
            None,
            format!("decimal precision must be between 1 and {max}, got {precision}"),
        ));
    }
    match scale {
        Some(s) if s > precision => Err(context.report(
            DiagnosticCode::InvalidNumericScale,
            None,
            format!("decimal scale {s} exceeds precision {precision}"),
        )),
        Some(s) => Ok(Type::decimal(precision, s)),
        None => Err(context.report(
            DiagnosticCode::FlexibleLengthIsNotSupported,
            None,
            "flexible scale requires flexible precision",
        )),
    }
}

/// Resolve a type node to an IR type
pub fn resolve_type(context: &mut AnalyzerContext, data_type: &DataType) -> AnalyzerResult<Type> {
    let ty = match data_type {
        DataType::Boolean => Type::Boolean,
        DataType::TinyInt => Type::Int1,
        DataType::SmallInt => Type::Int2,
        DataType::Int => Type::Int4,
        DataType::BigInt => Type::Int8,
        DataType::Real => Type::Float4,
        DataType::Float | DataType::DoublePrecision => Type::Float8,
        DataType::Decimal { precision, scale } => decimal(context, *precision, *scale)?,
        DataType::Character { varying, length } => Type::Character {
            varying: *varying,
            length: string_length(context, *varying, *length)?,
        },
        DataType::Octet { varying, length } => Type::Octet {
            varying: *varying,
            length: string_length(context, *varying, *length)?,
        },
        DataType::Bit { varying, length } => Type::Bit {
            varying: *varying,
            length: string_length(context, *varying, *length)?,
        },
        DataType::Date => Type::Date,
        DataType::Time { with_time_zone } => Type::TimeOfDay {
            with_time_zone: *with_time_zone,
        },
        DataType::Timestamp { with_time_zone } => Type::TimePoint {
            with_time_zone: *with_time_zone,
        },
        DataType::UserDefined(name) => {
            return Err(context.report(
                DiagnosticCode::UnsupportedFeature,
                Some(name.span()),
                format!("type '{name}' is not supported"),
            ));
        }
    };
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use relsql_catalog::{Catalog, MemoryCatalog};

    use super::*;
    use crate::options::AnalyzerOptions;

    fn context(options: AnalyzerOptions) -> AnalyzerContext {
        let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new("db"));
        AnalyzerContext::new(options, catalog)
    }

    fn code(context: &AnalyzerContext) -> Option<DiagnosticCode> {
        context.diagnostics().last().map(|d| d.code)
    }

    #[test]
    fn test_scalar_types() {
        let mut context = context(AnalyzerOptions::default());
        assert_eq!(resolve_type(&mut context, &DataType::Int).unwrap(), Type::Int4);
        assert_eq!(resolve_type(&mut context, &DataType::Float).unwrap(), Type::Float8);
        assert_eq!(resolve_type(&mut context, &DataType::Real).unwrap(), Type::Float4);
        assert_eq!(
            resolve_type(&mut context, &DataType::varchar(20)).unwrap(),
            Type::varchar(20)
        );
    }

    #[test]
    fn test_character_lengths() {
        let mut context = context(AnalyzerOptions::default());
        let char_default = DataType::Character {
            varying: false,
            length: None,
        };
        assert_eq!(resolve_type(&mut context, &char_default).unwrap(), Type::char(1));

        let varchar_flexible = DataType::Character {
            varying: true,
            length: Some(Length::Flexible),
        };
        assert_eq!(
            resolve_type(&mut context, &varchar_flexible).unwrap(),
            Type::FLEXIBLE_VARCHAR
        );

        let char_flexible = DataType::Character {
            varying: false,
            length: Some(Length::Flexible),
        };
        assert!(resolve_type(&mut context, &char_flexible).is_err());
        assert_eq!(code(&context), Some(DiagnosticCode::FlexibleLengthIsNotSupported));

        assert!(resolve_type(&mut context, &DataType::varchar(0)).is_err());
        assert_eq!(code(&context), Some(DiagnosticCode::InvalidTypeLength));
    }

    #[test]
    fn test_decimal_defaults_and_bounds() {
        let mut context = context(AnalyzerOptions::default());
        let bare = DataType::Decimal {
            precision: None,
            scale: None,
        };
        assert_eq!(
            resolve_type(&mut context, &bare).unwrap(),
            Type::FLEXIBLE_DECIMAL
        );
        assert_eq!(
            resolve_type(&mut context, &DataType::decimal(10, 2)).unwrap(),
            Type::decimal(10, 2)
        );

        assert!(resolve_type(&mut context, &DataType::decimal(39, 0)).is_err());
        assert_eq!(code(&context), Some(DiagnosticCode::InvalidNumericPrecision));
        assert!(resolve_type(&mut context, &DataType::decimal(0, 0)).is_err());
        assert_eq!(code(&context), Some(DiagnosticCode::InvalidNumericPrecision));
        assert!(resolve_type(&mut context, &DataType::decimal(3, 4)).is_err());
        assert_eq!(code(&context), Some(DiagnosticCode::InvalidNumericScale));
    }

    #[test]
    fn test_decimal_default_precision_option() {
        let mut context = context(AnalyzerOptions {
            default_decimal_precision: Some(18),
            default_decimal_scale: Some(4),
            ..Default::default()
        });
        let bare = DataType::Decimal {
            precision: None,
            scale: None,
        };
        assert_eq!(
            resolve_type(&mut context, &bare).unwrap(),
            Type::decimal(18, 4)
        );
    }

    #[test]
    fn test_user_defined_is_unsupported() {
        let mut context = context(AnalyzerOptions::default());
        let ty = DataType::UserDefined(relsql_ast::Name::simple("geometry"));
        assert!(resolve_type(&mut context, &ty).is_err());
        assert_eq!(code(&context), Some(DiagnosticCode::UnsupportedFeature));
    }
}
