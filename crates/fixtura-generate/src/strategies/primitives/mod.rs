use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use rand::seq::IndexedRandom;

use fixtura_core::{PrimitiveKind, TypeRef, TypeShape, Value};

use crate::context::ResolutionContext;
use crate::engine::ResolverChain;
use crate::model::GenerateOptions;
use crate::resolution::{Resolution, UnresolvedReason};
use crate::strategies::Strategy;

const DEFAULT_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SECONDS_PER_DAY: u32 = 86_400;

pub fn register(chain: &mut ResolverChain) {
    chain.push(Arc::new(PrimitiveStrategy));
    chain.push(Arc::new(EnumStrategy));
}

/// Scalars drawn straight from the random source; never recurses.
pub struct PrimitiveStrategy;

impl Strategy for PrimitiveStrategy {
    fn id(&self) -> &'static str {
        "primitive"
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        let TypeShape::Primitive(kind) = ctx.describe(request)? else {
            return None;
        };
        let options = ctx.options();
        let resolution = match generate_primitive(kind, options, ctx.rng()) {
            Ok(value) => Resolution::Resolved(value),
            Err(message) => {
                Resolution::unresolved(request, UnresolvedReason::Unsatisfiable { message })
            }
        };
        Some(resolution)
    }
}

/// Uniform pick among the declared constants of an enum.
pub struct EnumStrategy;

impl Strategy for EnumStrategy {
    fn id(&self) -> &'static str {
        "primitive.enum"
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        let TypeShape::Enum(labels) = ctx.describe(request)? else {
            return None;
        };
        let resolution = match labels.choose(ctx.rng()) {
            Some(variant) => Resolution::Resolved(Value::Enum {
                type_name: request.to_string(),
                variant: variant.clone(),
            }),
            None => Resolution::unresolved(request, UnresolvedReason::EmptyEnum),
        };
        Some(resolution)
    }
}

/// Random value of `kind` within the configured bounds.
pub fn generate_primitive(
    kind: PrimitiveKind,
    options: &GenerateOptions,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, String> {
    let value = match kind {
        PrimitiveKind::Bool => Value::Bool(rng.random_bool(0.5)),
        PrimitiveKind::F32 => {
            let min = options.float_min.max(f32::MIN as f64);
            let max = options.float_max.min(f32::MAX as f64);
            if min > max {
                return Err(format!("float range does not intersect {kind}"));
            }
            Value::Float(random_float(min, max, rng)? as f32 as f64)
        }
        PrimitiveKind::F64 => {
            Value::Float(random_float(options.float_min, options.float_max, rng)?)
        }
        PrimitiveKind::Char => Value::Char(random_char(rng)),
        PrimitiveKind::String => Value::Text(random_text(
            options.string_min_len,
            options.string_max_len,
            rng,
        )),
        PrimitiveKind::Uuid => Value::Uuid(random_uuid(rng)),
        PrimitiveKind::Date => Value::Date(random_date(rng)?),
        PrimitiveKind::DateTime => {
            let date = random_date(rng)?;
            let seconds = rng.random_range(0..SECONDS_PER_DAY);
            let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
                .ok_or_else(|| format!("invalid time of day {seconds}"))?;
            Value::DateTime(NaiveDateTime::new(date, time))
        }
        _ => return generate_integer(kind, options, rng),
    };
    Ok(value)
}

fn generate_integer(
    kind: PrimitiveKind,
    options: &GenerateOptions,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, String> {
    let (kind_min, kind_max) = kind
        .int_bounds()
        .ok_or_else(|| format!("{kind} is not an integer kind"))?;
    let min = options
        .int_min
        .map_or(kind_min, |min| kind_min.max(min as i128));
    let max = options
        .int_max
        .map_or(kind_max, |max| kind_max.min(max as i128));
    if min > max {
        return Err(format!(
            "integer range [{:?}, {:?}] does not intersect {kind}",
            options.int_min, options.int_max
        ));
    }
    let value = rng.random_range(min..=max);
    Ok(if kind.is_unsigned() {
        Value::UInt(value as u64)
    } else {
        Value::Int(value as i64)
    })
}

/// `random_range` panics on a span that overflows to infinity.
fn random_float(min: f64, max: f64, rng: &mut dyn rand::RngCore) -> Result<f64, String> {
    if !(max - min).is_finite() {
        return Err(format!("float range [{min}, {max}] is too wide to sample"));
    }
    Ok(rng.random_range(min..=max))
}

fn random_char(rng: &mut dyn rand::RngCore) -> char {
    let idx = rng.random_range(0..DEFAULT_CHARSET.len());
    DEFAULT_CHARSET[idx] as char
}

fn random_text(min_len: usize, max_len: usize, rng: &mut dyn rand::RngCore) -> String {
    let len = if min_len == max_len {
        min_len
    } else {
        rng.random_range(min_len..=max_len)
    };
    let mut value = String::with_capacity(len);
    for _ in 0..len {
        value.push(random_char(rng));
    }
    value
}

fn random_uuid(rng: &mut dyn rand::RngCore) -> uuid::Uuid {
    let mut bytes = [0_u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

fn random_date(rng: &mut dyn rand::RngCore) -> Result<NaiveDate, String> {
    let min = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or("invalid minimum date")?;
    let max = NaiveDate::from_ymd_opt(2099, 12, 31).ok_or("invalid maximum date")?;
    let span = (max - min).num_days();
    let offset = rng.random_range(0..=span);
    min.checked_add_signed(chrono::Duration::days(offset))
        .ok_or_else(|| format!("date offset {offset} out of range"))
}
