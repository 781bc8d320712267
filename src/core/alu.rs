//! Arithmetic Logic Unit.
//!
//! Mirrors the teacher's `Alu::execute(op, a, b, ...)` dispatch-by-enum
//! shape, but every operation here also writes flags, so each is its own
//! method on `Alu` rather than arms of one `execute` function — the
//! teacher's `AluOp` enum has no flag side effects to carry, ours does.
//!
//! An `Alu` holds a mutable back-reference to the register file solely
//! to write flags; it performs no other register or RAM access.

use crate::core::registers::RegisterFile;

/// Upper/lower bound of the signed 64-bit range, used for integer
/// overflow checks computed in infinite precision.
const MAX_I64: i128 = i64::MAX as i128;
const MIN_I64: i128 = i64::MIN as i128;

/// Upper/lower bound of the signed 32-bit range, used for Q32.32
/// integer-part overflow checks.
const MAX_I32: i64 = i32::MAX as i64;
const MIN_I32: i64 = i32::MIN as i64;

/// The arithmetic/logic unit. Holds a mutable reference to the register
/// file it writes flags into.
pub struct Alu<'a> {
    regs: &'a mut RegisterFile,
}

impl<'a> Alu<'a> {
    pub fn new(regs: &'a mut RegisterFile) -> Self {
        Self { regs }
    }

    fn check_overflow_add(&mut self, a: u64, b: u64, result: u64) {
        let a_sign = (a >> 63) & 1;
        let b_sign = (b >> 63) & 1;
        let r_sign = (result >> 63) & 1;
        self.regs.flags.d = a_sign == b_sign && a_sign != r_sign;
        self.regs.flags.u = false;
    }

    /// Overflow for `a - b`: signed overflow happens when the operands'
    /// signs differ and the result's sign doesn't match the minuend's.
    fn check_overflow_sub(&mut self, a: u64, b: u64, result: u64) {
        let a_sign = (a >> 63) & 1;
        let b_sign = (b >> 63) & 1;
        let r_sign = (result >> 63) & 1;
        self.regs.flags.d = a_sign != b_sign && a_sign != r_sign;
        self.regs.flags.u = false;
    }

    fn check_overflow_float(&mut self, result: u64) {
        let integer_part = (result >> 32) as i32 as i64;
        self.regs.flags.d = !(MIN_I32..=MAX_I32).contains(&integer_part);
        self.regs.flags.u = integer_part == 0 && result != 0;
    }

    /// `a + b`, truncated to 64 bits. `D` set iff operand signs match and
    /// differ from the result's sign.
    pub fn add(&mut self, a: u64, b: u64) -> u64 {
        let result = a.wrapping_add(b);
        self.check_overflow_add(a, b, result);
        self.regs.flags.set_zn(result);
        result
    }

    /// `a - b`, truncated to 64 bits. `D` set iff operand signs differ and
    /// the result's sign doesn't match `a`'s.
    pub fn sub(&mut self, a: u64, b: u64) -> u64 {
        let result = a.wrapping_sub(b);
        self.check_overflow_sub(a, b, result);
        self.regs.flags.set_zn(result);
        result
    }

    /// `a * b` computed in infinite precision then truncated. `D` set iff
    /// the signed product falls outside `[-2^63, 2^63-1]`.
    ///
    /// An earlier revision of this routine computed `a + b` here, which
    /// made `MUL` behave like a second `ADD`; see DESIGN.md for the
    /// history. This implementation uses the corrected `a * b`.
    pub fn mul(&mut self, a: u64, b: u64) -> u64 {
        let raw = (a as i64 as i128) * (b as i64 as i128);
        self.regs.flags.d = !(MIN_I64..=MAX_I64).contains(&raw);
        self.regs.flags.u = false;
        let result = raw as u64;
        self.regs.flags.set_zn(result);
        result
    }

    /// Signed floored division: `a // b` in the Python sense (rounds
    /// toward negative infinity, not toward zero — see DESIGN.md Open
    /// Question log). Fatal on `b == 0`.
    pub fn div(&mut self, a: u64, b: u64) -> Result<u64, crate::common::ExecutionError> {
        if b == 0 {
            return Err(crate::common::ExecutionError::DivideByZero);
        }
        let raw = (a as i64 as i128).div_euclid_floor(b as i64 as i128);
        self.regs.flags.d = !(MIN_I64..=MAX_I64).contains(&raw);
        self.regs.flags.u = false;
        let result = raw as u64;
        self.regs.flags.set_zn(result);
        Ok(result)
    }

    /// `a - b`; updates flags but discards the result.
    pub fn comp(&mut self, a: u64, b: u64) {
        let result = a.wrapping_sub(b);
        self.check_overflow_sub(a, b, result);
        self.regs.flags.set_zn(result);
    }

    /// Q32.32 addition: plain 64-bit add on the raw word.
    pub fn add_float(&mut self, a: u64, b: u64) -> u64 {
        let result = a.wrapping_add(b);
        self.check_overflow_float(result);
        self.regs.flags.set_zn(result);
        result
    }

    /// Q32.32 subtraction: plain 64-bit sub on the raw word.
    pub fn sub_float(&mut self, a: u64, b: u64) -> u64 {
        let result = a.wrapping_sub(b);
        self.check_overflow_float(result);
        self.regs.flags.set_zn(result);
        result
    }

    /// Q32.32 multiplication: `(a * b) >> 32` in infinite precision.
    pub fn mul_float(&mut self, a: u64, b: u64) -> u64 {
        let raw = ((a as i64 as i128) * (b as i64 as i128)) >> 32;
        let result = raw as u64;
        self.check_overflow_float(result);
        self.regs.flags.set_zn(result);
        result
    }

    /// Q32.32 division: `(a << 32) / b` in infinite precision. Fatal on
    /// `b == 0`.
    pub fn div_float(&mut self, a: u64, b: u64) -> Result<u64, crate::common::ExecutionError> {
        if b == 0 {
            return Err(crate::common::ExecutionError::DivideByZero);
        }
        let raw = ((a as i64 as i128) << 32).div_euclid_floor(b as i64 as i128);
        let result = raw as u64;
        self.check_overflow_float(result);
        self.regs.flags.set_zn(result);
        Ok(result)
    }

    /// Bitwise AND. `D = U = 0`.
    pub fn and(&mut self, a: u64, b: u64) -> u64 {
        let result = a & b;
        self.regs.flags.d = false;
        self.regs.flags.u = false;
        self.regs.flags.set_zn(result);
        result
    }

    /// Bitwise OR. `D = U = 0`.
    pub fn or(&mut self, a: u64, b: u64) -> u64 {
        let result = a | b;
        self.regs.flags.d = false;
        self.regs.flags.u = false;
        self.regs.flags.set_zn(result);
        result
    }

    /// Bitwise XOR. `D = U = 0`.
    pub fn xor(&mut self, a: u64, b: u64) -> u64 {
        let result = a ^ b;
        self.regs.flags.d = false;
        self.regs.flags.u = false;
        self.regs.flags.set_zn(result);
        result
    }

    /// Bitwise NOT. `D = U = 0`.
    pub fn not(&mut self, a: u64) -> u64 {
        let result = !a;
        self.regs.flags.d = false;
        self.regs.flags.u = false;
        self.regs.flags.set_zn(result);
        result
    }

    /// Logical left shift by `n`. `D` set iff the sign bit changed
    /// between `a` and the masked result. `U = 0`.
    pub fn shift_left(&mut self, a: u64, n: u32) -> u64 {
        let result = if n >= 64 { 0 } else { a << n };
        let original_sign = (a >> 63) & 1;
        let result_sign = (result >> 63) & 1;
        self.regs.flags.d = original_sign != result_sign;
        self.regs.flags.u = false;
        self.regs.flags.set_zn(result);
        result
    }

    /// Arithmetic right shift by `n` (sign-extending). `D = U = 0`.
    pub fn shift_right(&mut self, a: u64, n: u32) -> u64 {
        let signed = a as i64;
        let result = if n >= 64 {
            if signed < 0 { u64::MAX } else { 0 }
        } else {
            (signed >> n) as u64
        };
        self.regs.flags.d = false;
        self.regs.flags.u = false;
        self.regs.flags.set_zn(result);
        result
    }

    /// Absolute value of `a` reinterpreted as signed 64-bit. Only `Z`/`N`
    /// are updated; `D`/`U` are left as they were.
    pub fn abs_val(&mut self, a: u64) -> u64 {
        let result = (a as i64).wrapping_abs() as u64;
        self.regs.flags.set_zn(result);
        result
    }

    /// Two's-complement negation. `(~a).wrapping_add(1)`; self-inverse
    /// except at `i64::MIN`, which maps to itself.
    pub fn chng_sig(&mut self, a: u64) -> u64 {
        let result = a.wrapping_neg();
        self.regs.flags.set_zn(result);
        result
    }

    /// Takes the integer part of a Q32.32 value: upper 32 bits,
    /// sign-extended to 64.
    pub fn chng_int(&mut self, a: u64) -> u64 {
        let result = ((a >> 32) as i32) as i64 as u64;
        self.regs.flags.set_zn(result);
        result
    }

    /// Produces a Q32.32 value from a plain integer: `a << 32`.
    pub fn chng_float(&mut self, a: u64) -> u64 {
        let result = a << 32;
        self.regs.flags.set_zn(result);
        result
    }
}

/// Floored integer division, matching Python's `//` (rounds toward
/// negative infinity rather than toward zero).
trait DivEuclidFloor {
    fn div_euclid_floor(self, rhs: Self) -> Self;
}

impl DivEuclidFloor for i128 {
    fn div_euclid_floor(self, rhs: Self) -> Self {
        let q = self / rhs;
        let r = self % rhs;
        if (r != 0) && ((r < 0) != (rhs < 0)) {
            q - 1
        } else {
            q
        }
    }
}
