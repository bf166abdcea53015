//! IEEE 754 binary128 samples.
//!
//! There is no native 128-bit float, so 16-byte float samples are kept as
//! their bit pattern and converted on demand. Conversions from `f64` and
//! from integers of up to 113 bits are exact. Every narrowing conversion,
//! to `f64`, `f32` or from wide integers and decimals, rounds once to
//! nearest, ties to even.

use std::cmp::Ordering;

const FRAC_BITS: u32 = 112;
const FRAC_MASK: u128 = (1 << FRAC_BITS) - 1;
const EXP_MASK: u128 = 0x7fff;
const EXP_BIAS: i32 = 16383;
const SIGN_BIT: u128 = 1 << 127;

const F64_FRAC_BITS: u32 = 52;
const F64_FRAC_MASK: u64 = (1 << F64_FRAC_BITS) - 1;
const F64_EXP_BIAS: i32 = 1023;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Quad(u128);

// Round `value >> shift` to nearest, ties to even. `sticky` marks a nonzero
// remainder below the bits of `value`.
fn shift_round(value: u128, shift: u32, sticky: bool) -> u128 {
    if shift == 0 {
        return value;
    }
    if shift > 127 {
        return 0;
    }
    let keep = value >> shift;
    let rem = value & ((1 << shift) - 1);
    let half = 1u128 << (shift - 1);
    if rem > half || (rem == half && (sticky || keep & 1 == 1)) {
        keep + 1
    } else {
        keep
    }
}

// Little endian limbs of an unsigned integer, without leading zero limbs
#[derive(Debug, Clone, PartialEq, Eq)]
struct Limbs(Vec<u64>);

impl Limbs {
    fn from_u128(value: u128) -> Limbs {
        let mut limbs = Limbs(vec![value as u64, (value >> 64) as u64]);
        limbs.trim();
        limbs
    }

    fn trim(&mut self) {
        while self.0.last() == Some(&0) {
            self.0.pop();
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    fn bit_len(&self) -> u32 {
        match self.0.last() {
            Some(top) => (self.0.len() as u32 - 1) * 64 + (64 - top.leading_zeros()),
            None => 0,
        }
    }

    fn mul_small(&mut self, factor: u64) {
        let mut carry = 0u128;
        for limb in self.0.iter_mut() {
            let v = u128::from(*limb) * u128::from(factor) + carry;
            *limb = v as u64;
            carry = v >> 64;
        }
        if carry != 0 {
            self.0.push(carry as u64);
        }
    }

    fn mul_pow10(&mut self, mut exp: u32) {
        while exp >= 19 {
            self.mul_small(10u64.pow(19));
            exp -= 19;
        }
        self.mul_small(10u64.pow(exp));
    }

    fn shl(&self, bits: u32) -> Limbs {
        let bits_in_limb = bits % 64;
        let mut out = vec![0u64; (bits / 64) as usize];
        let mut carry = 0u64;
        for limb in &self.0 {
            if bits_in_limb == 0 {
                out.push(*limb);
            } else {
                out.push((limb << bits_in_limb) | carry);
                carry = limb >> (64 - bits_in_limb);
            }
        }
        if carry != 0 {
            out.push(carry);
        }
        Limbs(out)
    }

    // Requires self >= other
    fn sub_assign(&mut self, other: &Limbs) {
        let mut borrow = false;
        for (i, limb) in self.0.iter_mut().enumerate() {
            let (v, b1) = limb.overflowing_sub(other.0.get(i).copied().unwrap_or(0));
            let (v, b2) = v.overflowing_sub(u64::from(borrow));
            *limb = v;
            borrow = b1 || b2;
        }
        self.trim();
    }
}

impl PartialOrd for Limbs {
    fn partial_cmp(&self, other: &Limbs) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Limbs {
    fn cmp(&self, other: &Limbs) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.iter().rev().cmp(other.0.iter().rev()))
    }
}

// Quotient and whether there was a remainder. The quotient must fit in
// 128 bits.
fn div_rem(mut num: Limbs, den: &Limbs) -> (u128, bool) {
    let mut quotient = 0u128;
    let top = num.bit_len().saturating_sub(den.bit_len());
    for i in (0..=top).rev() {
        let part = den.shl(i);
        if num >= part {
            num.sub_assign(&part);
            quotient |= 1 << i;
        }
    }
    (quotient, !num.is_zero())
}

// Decimal exponents beyond these are infinite or round to zero for any
// 128-bit mantissa
const MAX_DECIMAL_EXP: i32 = 4932;
const MIN_DECIMAL_EXP: i32 = -5005;

impl Quad {
    pub const ZERO: Quad = Quad(0);

    pub fn from_bits(bits: u128) -> Quad {
        Quad(bits)
    }

    pub fn to_bits(&self) -> u128 {
        self.0
    }

    fn sign(&self) -> bool {
        self.0 & SIGN_BIT != 0
    }

    fn biased_exponent(&self) -> i32 {
        ((self.0 >> FRAC_BITS) & EXP_MASK) as i32
    }

    fn fraction(&self) -> u128 {
        self.0 & FRAC_MASK
    }

    pub fn is_nan(&self) -> bool {
        self.biased_exponent() == EXP_MASK as i32 && self.fraction() != 0
    }

    pub fn from_f64(value: f64) -> Quad {
        let bits = value.to_bits();
        let sign = if bits >> 63 != 0 { SIGN_BIT } else { 0 };
        let exp = ((bits >> F64_FRAC_BITS) & 0x7ff) as i32;
        let frac = bits & F64_FRAC_MASK;
        let (qexp, qfrac) = if exp == 0x7ff {
            // Infinity or NaN, NaN payload is kept
            (EXP_MASK, u128::from(frac) << (FRAC_BITS - F64_FRAC_BITS))
        } else if exp == 0 {
            if frac == 0 {
                (0, 0)
            } else {
                // Subnormal f64, normal as binary128
                let lead = 63 - frac.leading_zeros() as i32;
                let norm = (frac << (F64_FRAC_BITS as i32 - lead)) & F64_FRAC_MASK;
                (
                    (lead - 1074 + EXP_BIAS) as u128,
                    u128::from(norm) << (FRAC_BITS - F64_FRAC_BITS),
                )
            }
        } else {
            (
                (exp - F64_EXP_BIAS + EXP_BIAS) as u128,
                u128::from(frac) << (FRAC_BITS - F64_FRAC_BITS),
            )
        };
        Quad(sign | (qexp << FRAC_BITS) | qfrac)
    }

    /// Exact when `|value| < 2^113`, otherwise rounded to nearest.
    pub fn from_i128(value: i128) -> Quad {
        Quad::round_pack(value < 0, value.unsigned_abs(), 0, false)
    }

    /// `mantissa * 10^exponent`, correctly rounded.
    pub fn from_decimal_parts(mantissa: i128, exponent: i32) -> Quad {
        let negative = mantissa < 0;
        let mag = mantissa.unsigned_abs();
        if mag == 0 || exponent < MIN_DECIMAL_EXP {
            return Quad::round_pack(negative, 0, 0, false);
        }
        if exponent > MAX_DECIMAL_EXP {
            return Quad::infinity(negative);
        }
        let mut num = Limbs::from_u128(mag);
        let mut den = Limbs::from_u128(1);
        if exponent >= 0 {
            num.mul_pow10(exponent as u32);
        } else {
            den.mul_pow10(exponent.unsigned_abs());
        }
        // Scale so the quotient has 116 or 117 bits
        let shift = 116 + den.bit_len() as i32 - num.bit_len() as i32;
        let (quotient, sticky) = if shift >= 0 {
            div_rem(num.shl(shift as u32), &den)
        } else {
            div_rem(num, &den.shl(shift.unsigned_abs()))
        };
        Quad::round_pack(negative, quotient, -shift, sticky)
    }

    fn infinity(negative: bool) -> Quad {
        let sign = if negative { SIGN_BIT } else { 0 };
        Quad(sign | (EXP_MASK << FRAC_BITS))
    }

    // The value `(sig + r) * 2^exp2` where 0 <= r < 1 and `sticky` tells
    // if r > 0. A nonzero r needs at least two bits below the rounding
    // point.
    fn round_pack(negative: bool, sig: u128, exp2: i32, sticky: bool) -> Quad {
        let sign = if negative { SIGN_BIT } else { 0 };
        if sig == 0 {
            return Quad(sign);
        }
        let lead = 127 - sig.leading_zeros() as i32;
        let mut bexp = lead + exp2 + EXP_BIAS;
        if bexp >= EXP_MASK as i32 {
            return Quad::infinity(negative);
        }
        if bexp <= 0 {
            // Subnormal, the fraction counts units of 2^-16494. A carry
            // into the exponent field gives the smallest normal.
            let shift = -(exp2 + EXP_BIAS - 1 + FRAC_BITS as i32);
            let frac = if shift < 0 {
                sig << shift.unsigned_abs()
            } else {
                shift_round(sig, shift as u32, sticky)
            };
            return Quad(sign | frac);
        }
        let shift = lead - FRAC_BITS as i32;
        let mut keep = if shift < 0 {
            sig << shift.unsigned_abs()
        } else {
            shift_round(sig, shift as u32, sticky)
        };
        if keep >> (FRAC_BITS + 1) != 0 {
            // Rounded up to the next power of two
            keep >>= 1;
            bexp += 1;
            if bexp >= EXP_MASK as i32 {
                return Quad::infinity(negative);
            }
        }
        Quad(sign | ((bexp as u128) << FRAC_BITS) | (keep & FRAC_MASK))
    }

    // Bit pattern of the nearest value in a narrower IEEE format
    fn narrow(&self, frac_bits: u32, exp_bits: u32) -> u64 {
        let exp_max = (1u64 << exp_bits) - 1;
        let bias = (exp_max >> 1) as i32;
        let sign = if self.sign() {
            1u64 << (frac_bits + exp_bits)
        } else {
            0
        };
        let inf = sign | (exp_max << frac_bits);
        let bexp = self.biased_exponent();
        let frac = self.fraction();
        if bexp == EXP_MASK as i32 {
            return if frac == 0 {
                inf
            } else {
                // Quiet NaN, keeping the top of the payload
                inf | (frac >> (FRAC_BITS - frac_bits)) as u64 | (1 << (frac_bits - 1))
            };
        }
        if bexp == 0 {
            // Zero or binary128 subnormal, far below any narrower range
            return sign;
        }
        let sig = frac | (1 << FRAC_BITS);
        let mut exp = bexp - EXP_BIAS;
        if exp > bias {
            return inf;
        }
        if exp >= 1 - bias {
            let mut keep = shift_round(sig, FRAC_BITS - frac_bits, false);
            if keep >> (frac_bits + 1) != 0 {
                keep >>= 1;
                exp += 1;
                if exp > bias {
                    return inf;
                }
            }
            let bits = ((exp + bias) as u64) << frac_bits;
            return sign | bits | (keep as u64 & ((1 << frac_bits) - 1));
        }
        // Subnormal: the significand in units of the smallest subnormal. A
        // carry into the exponent field gives the smallest normal.
        let shift = (FRAC_BITS as i32 - frac_bits as i32 + 1 - bias - exp) as u32;
        sign | shift_round(sig, shift, false) as u64
    }

    pub fn to_f64(&self) -> f64 {
        f64::from_bits(self.narrow(F64_FRAC_BITS, 11))
    }

    pub fn to_f32(&self) -> f32 {
        f32::from_bits(self.narrow(23, 8) as u32)
    }

    /// Integer part truncated toward zero, saturated at the `i128` range.
    /// `None` for NaN.
    pub fn trunc_to_i128(&self) -> Option<i128> {
        if self.is_nan() {
            return None;
        }
        let bexp = self.biased_exponent();
        let exp = bexp - EXP_BIAS;
        if bexp == 0 || exp < 0 {
            return Some(0);
        }
        if exp >= 127 {
            return Some(if self.sign() { i128::MIN } else { i128::MAX });
        }
        let sig = self.fraction() | (1 << FRAC_BITS);
        let exp = exp as u32;
        let mag = if exp >= FRAC_BITS {
            sig << (exp - FRAC_BITS)
        } else {
            sig >> (FRAC_BITS - exp)
        };
        // exp < 127 keeps the magnitude below 2^127
        Some(if self.sign() {
            -(mag as i128)
        } else {
            mag as i128
        })
    }
}

#[cfg(test)]
use test_log::test;

#[test]
fn test_known_patterns() {
    assert_eq!(Quad::from_f64(1.0).to_bits(), 0x3fff_0000_0000_0000_0000_0000_0000_0000);
    assert_eq!(Quad::from_f64(-2.0).to_bits(), 0xc000_0000_0000_0000_0000_0000_0000_0000);
    assert_eq!(Quad::from_f64(0.0).to_bits(), 0);
    assert_eq!(Quad::from_f64(-0.0).to_bits(), SIGN_BIT);
    assert_eq!(
        Quad::from_f64(f64::INFINITY).to_bits(),
        0x7fff_0000_0000_0000_0000_0000_0000_0000
    );
    assert_eq!(Quad::from_i128(1), Quad::from_f64(1.0));
    assert_eq!(Quad::from_i128(-2), Quad::from_f64(-2.0));
}

#[test]
fn test_f64_round_trip() {
    for v in [
        1.0,
        -1.5,
        0.1,
        std::f64::consts::PI,
        f64::MAX,
        f64::MIN_POSITIVE,
        5e-324,
        -4.9e-320,
        f64::INFINITY,
        f64::NEG_INFINITY,
    ] {
        assert_eq!(Quad::from_f64(v).to_f64(), v);
    }
    assert!(Quad::from_f64(f64::NAN).is_nan());
    assert!(Quad::from_f64(f64::NAN).to_f64().is_nan());
}

#[test]
fn test_narrowing() {
    // 1 + 2^-60 rounds to 1.0
    let q = Quad::from_bits(0x3fff_0000_0000_0000_0000_0000_0000_0000 | (1 << 52));
    assert_eq!(q.to_f64(), 1.0);
    // 1 + 2^-53 is a tie, rounds to even
    let q = Quad::from_bits(0x3fff_0000_0000_0000_0000_0000_0000_0000 | (1 << 59));
    assert_eq!(q.to_f64(), 1.0);
    // Just above the tie rounds up
    let q = Quad::from_bits(0x3fff_0000_0000_0000_0000_0000_0000_0000 | (1 << 59) | 1);
    assert_eq!(q.to_f64(), 1.0 + f64::EPSILON);
    // 2^1024 overflows
    let q = Quad::from_bits((16383u128 + 1024) << 112);
    assert_eq!(q.to_f64(), f64::INFINITY);
    // 2^-1080 underflows to zero, 2^-1074 is the smallest subnormal
    let q = Quad::from_bits((16383u128 - 1080) << 112);
    assert_eq!(q.to_f64(), 0.0);
    let q = Quad::from_bits((16383u128 - 1074) << 112);
    assert_eq!(q.to_f64(), 5e-324);
}

#[test]
fn test_integers() {
    for v in [0i128, 1, -1, 255, -32768, i64::MAX as i128, i64::MIN as i128, u64::MAX as i128] {
        assert_eq!(Quad::from_i128(v).trunc_to_i128(), Some(v));
    }
    assert_eq!(Quad::from_f64(-2.75).trunc_to_i128(), Some(-2));
    assert_eq!(Quad::from_f64(0.99).trunc_to_i128(), Some(0));
    assert_eq!(Quad::from_f64(1e300).trunc_to_i128(), Some(i128::MAX));
    assert_eq!(Quad::from_f64(f64::NEG_INFINITY).trunc_to_i128(), Some(i128::MIN));
    assert_eq!(Quad::from_f64(f64::NAN).trunc_to_i128(), None);
    assert_eq!(Quad::from_i128(i128::MIN).trunc_to_i128(), Some(i128::MIN));
}

#[test]
fn test_to_f32() {
    let one = 0x3fff_0000_0000_0000_0000_0000_0000_0000u128;
    // 1 + 2^-24 + 2^-60 is just above the tie, one rounding step goes up
    let q = Quad::from_bits(one | (1 << 88) | (1 << 52));
    assert_eq!(q.to_f32(), 1.0 + f32::EPSILON);
    // Going through f64 would land on the tie and round to even
    assert_eq!(q.to_f64() as f32, 1.0);
    // 1 + 2^-24 is a tie
    assert_eq!(Quad::from_bits(one | (1 << 88)).to_f32(), 1.0);

    for v in [1.5f32, -0.1, f32::MAX, f32::MIN_POSITIVE, 1e-45, f32::NEG_INFINITY] {
        assert_eq!(Quad::from_f64(v.into()).to_f32(), v);
    }
    assert_eq!(Quad::from_f64(1e39).to_f32(), f32::INFINITY);
    assert_eq!(Quad::from_f64(-1e-50).to_f32().to_bits(), (-0.0f32).to_bits());
    assert!(Quad::from_f64(f64::NAN).to_f32().is_nan());
}

#[test]
fn test_from_decimal_parts() {
    // 0.1 rounded to 113 bits
    assert_eq!(
        Quad::from_decimal_parts(1, -1).to_bits(),
        0x3ffb_9999_9999_9999_9999_9999_9999_999a
    );
    assert_eq!(Quad::from_decimal_parts(-15, -1), Quad::from_f64(-1.5));
    assert_eq!(Quad::from_decimal_parts(25, 3), Quad::from_i128(25000));
    let wide = (1i128 << 100) + 1;
    assert_eq!(Quad::from_decimal_parts(wide, 0).trunc_to_i128(), Some(wide));
    assert_eq!(
        Quad::from_decimal_parts(wide, 2).trunc_to_i128(),
        Some(wide * 100)
    );
    assert_eq!(Quad::from_decimal_parts(0, 100), Quad::ZERO);

    // The smallest subnormal is about 6.48e-4966
    assert_eq!(Quad::from_decimal_parts(6, -4966).to_bits(), 1);
    assert_eq!(Quad::from_decimal_parts(3, -4966).to_bits(), 0);
    assert_eq!(Quad::from_decimal_parts(-1, -6000).to_bits(), SIGN_BIT);

    // The largest finite value is about 1.19e4932
    assert_eq!(
        Quad::from_decimal_parts(1, 4932).to_bits() >> FRAC_BITS,
        EXP_MASK - 1
    );
    assert_eq!(Quad::from_decimal_parts(2, 4932), Quad::infinity(false));
    assert_eq!(Quad::from_decimal_parts(-1, 30000), Quad::infinity(true));
}
