//! Validation utilities for the Procurement Platform

use rust_decimal::Decimal;

// ============================================================================
// Line Item Validations
// ============================================================================

/// Validate a quotation/order line quantity (must be a positive integer)
pub fn validate_line_qty(qty: i64) -> Result<(), &'static str> {
    if qty <= 0 {
        return Err("Line quantity must be positive");
    }
    Ok(())
}

/// Validate a unit price snapshot (must not be negative)
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a display name is non-empty
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty");
    }
    if name.len() > 128 {
        return Err("Name must be at most 128 characters");
    }
    Ok(())
}

/// Validate a manufacturer part number (1-64 chars, no whitespace)
pub fn validate_part_number(part_number: &str) -> Result<(), &'static str> {
    if part_number.is_empty() {
        return Err("Part number cannot be empty");
    }
    if part_number.len() > 64 {
        return Err("Part number must be at most 64 characters");
    }
    if part_number.chars().any(char::is_whitespace) {
        return Err("Part number cannot contain whitespace");
    }
    Ok(())
}
