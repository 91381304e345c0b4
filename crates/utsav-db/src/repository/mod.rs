//! # Repository Module
//!
//! Repository implementations for database operations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Repository Pattern                                 │
//! │                                                                         │
//! │  Service layer (utsav-service)                                          │
//! │       │                                                                 │
//! │       │  db.bookings().insert(&booking, &audit).await?                  │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────────┐                      │
//! │  │              Repositories                     │                      │
//! │  │                                               │                      │
//! │  │  BookingRepository    - aggregate + status CAS│                      │
//! │  │  AttendeeRepository   - booking contacts      │                      │
//! │  │  PaymentRepository    - gateway orders        │                      │
//! │  │  TicketRepository     - units + is_used flip  │                      │
//! │  │  MessageLogRepository - dispatch audit trail  │                      │
//! │  └───────────────────────────────────────────────┘                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL mode)                                                      │
//! │                                                                         │
//! │  One repository per aggregate; all SQL lives here and nowhere else.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod attendee;
pub mod booking;
pub mod message;
pub mod payment;
pub mod ticket;
