//! # utsav-db: Database Layer for Utsav Ticketing
//!
//! This crate provides database access for the ticketing backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Utsav Ticketing Data Flow                           │
//! │                                                                         │
//! │  Service operation (create_booking, confirm_payment, mark_used)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     utsav-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (booking.rs,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  ticket.rs,   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  payment.rs,  │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │  attendee.rs, │    │ ...          │  │   │
//! │  │   │ Management    │    │  message.rs)  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (booking, ticket, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use utsav_db::{Database, DbConfig};
//!
//! // Create database with default config (runs migrations)
//! let db = Database::new(DbConfig::new("path/to/utsav.db")).await?;
//!
//! // Use repositories
//! let booking = db.bookings().get_by_id("...").await?;
//! let won = db.tickets().mark_used("TKT-...", chrono::Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::attendee::AttendeeRepository;
pub use repository::booking::BookingRepository;
pub use repository::message::{DispatchState, MessageChannel, MessageLogEntry, MessageLogRepository};
pub use repository::payment::PaymentRepository;
pub use repository::ticket::TicketRepository;
