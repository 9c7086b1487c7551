//! # Transaction Validation Errors
//!
//! Every validation failure carries one of three severities that decide
//! how far the rejection propagates:
//!
//! - [`TxErrorKind::NotValid`] — wrong regardless of chain state;
//!   permanently rejected, never retried.
//! - [`TxErrorKind::NotCurrentlyValid`] — true only given current chain
//!   state; may become valid again after a state change.
//! - [`TxErrorKind::Internal`] — store or task-VM failure unrelated to
//!   the submitted data; surfaced to the caller, nothing persisted.

/// Severity of a transaction rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxErrorKind {
    /// Structurally or semantically wrong regardless of chain state.
    NotValid,
    /// Invalid only given current chain state; retriable.
    NotCurrentlyValid,
    /// Infrastructure failure; nothing was persisted.
    Internal,
}

/// Transaction validation and application errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TxError {
    #[error("malformed attachment: {0}")]
    MalformedAttachment(String),

    #[error("unknown transaction type ({tx_type}, {subtype})")]
    UnknownTransactionType { tx_type: u8, subtype: u8 },

    #[error("title length {len} outside 1..={max}", max = crate::constants::MAX_TITLE_LENGTH)]
    TitleLength { len: usize },

    #[error("work deadline {deadline} outside {min}..={max} blocks", min = crate::constants::MIN_WORK_DEADLINE, max = crate::constants::MAX_WORK_DEADLINE)]
    WorkDeadlineOutOfBounds { deadline: u16 },

    #[error("bounty limit {limit} outside {min}..={max}", min = crate::constants::MIN_BOUNTY_LIMIT, max = crate::constants::MAX_BOUNTY_LIMIT)]
    BountyLimitOutOfBounds { limit: u32 },

    #[error("reward per proof-of-work {xel_per_pow} outside bounds")]
    RewardOutOfBounds { xel_per_pow: u64 },

    #[error("task amount {amount} below minimum funding {required}")]
    InsufficientFunding { amount: u64, required: u64 },

    #[error("input vector length {len} outside {min}..={max}", min = crate::constants::MIN_INTS_FOR_WORK, max = crate::constants::MAX_INTS_FOR_WORK)]
    InputVectorLength { len: usize },

    #[error("unsupported task-code language 0x{language:02x}")]
    UnsupportedLanguage { language: u8 },

    #[error("new task is missing its source-code appendix")]
    MissingSourceCode,

    #[error("bounty submission must carry zero amount, got {amount}")]
    NonZeroBountyAmount { amount: u64 },

    #[error("zero-fee transaction kind declared fee {fee}")]
    NonZeroFee { fee: u64 },

    #[error("fee {fee} below minimum {minimum}")]
    FeeTooLow { fee: u64, minimum: u64 },

    #[error("transaction kind requires zero amount, got {amount}")]
    AmountMustBeZero { amount: u64 },

    #[error("submission transaction deadline must be {required} minutes, got {deadline}", required = crate::constants::SUBMISSION_TX_DEADLINE)]
    WrongSubmissionDeadline { deadline: u16 },

    #[error("proof-of-work amount {amount} does not match reward per unit {xel_per_pow}")]
    AmountMismatch { amount: u64, xel_per_pow: u64 },

    #[error("announced hash length {len} exceeds 32 bytes")]
    AnnouncementHashLength { len: usize },

    #[error("recipient not allowed for this transaction kind")]
    RecipientNotAllowed,

    #[error("transaction kind requires a recipient")]
    MissingRecipient,

    #[error("transaction signature verification failed")]
    InvalidSignature,

    #[error("submitted proof of work does not meet the target")]
    PowRejectedByVm,

    #[error("bounty hook rejected the submitted input")]
    BountyRejectedByVm,

    #[error("unknown work {work_id}")]
    UnknownWork { work_id: u64 },

    #[error("work {work_id} is closed")]
    WorkClosed { work_id: u64 },

    #[error("work {work_id} pow fund remaining {remaining} cannot cover {required}")]
    InsufficientPowFund {
        work_id: u64,
        remaining: u64,
        required: u64,
    },

    #[error("work {work_id} bounty slots exhausted (limit {limit})")]
    BountySlotsExhausted { work_id: u64, limit: u32 },

    #[error("work {work_id} announcement slots exhausted (limit {limit})")]
    AnnouncementSlotsExhausted { work_id: u64, limit: u32 },

    #[error("duplicate submission for work {work_id}")]
    DuplicateSubmission { work_id: u64 },

    #[error("duplicate within block for work {work_id}")]
    DuplicateInBlock { work_id: u64 },

    #[error("hash already announced for work {work_id}")]
    DuplicateAnnouncement { work_id: u64 },

    #[error("unknown submission {submission_id}")]
    UnknownSubmission { submission_id: u64 },

    #[error("submission {submission_id} already paid out")]
    SubmissionAlreadyPaid { submission_id: u64 },

    #[error("payout does not match recorded submission {submission_id}")]
    PayoutMismatch { submission_id: u64 },

    #[error("account {account_id} does not own work {work_id}")]
    NotWorkOwner { work_id: u64, account_id: u64 },

    #[error("account {account_id} balance cannot cover {required}")]
    InsufficientBalance { account_id: u64, required: u64 },

    #[error("store failure: {0}")]
    Store(String),

    #[error("task VM failure: {0}")]
    Vm(String),
}

impl TxError {
    /// Severity of this rejection.
    pub fn kind(&self) -> TxErrorKind {
        match self {
            TxError::MalformedAttachment(_)
            | TxError::UnknownTransactionType { .. }
            | TxError::TitleLength { .. }
            | TxError::WorkDeadlineOutOfBounds { .. }
            | TxError::BountyLimitOutOfBounds { .. }
            | TxError::RewardOutOfBounds { .. }
            | TxError::InsufficientFunding { .. }
            | TxError::InputVectorLength { .. }
            | TxError::UnsupportedLanguage { .. }
            | TxError::MissingSourceCode
            | TxError::NonZeroBountyAmount { .. }
            | TxError::NonZeroFee { .. }
            | TxError::FeeTooLow { .. }
            | TxError::AmountMustBeZero { .. }
            | TxError::WrongSubmissionDeadline { .. }
            | TxError::AmountMismatch { .. }
            | TxError::AnnouncementHashLength { .. }
            | TxError::RecipientNotAllowed
            | TxError::MissingRecipient
            | TxError::InvalidSignature
            | TxError::PowRejectedByVm
            | TxError::BountyRejectedByVm => TxErrorKind::NotValid,

            TxError::UnknownWork { .. }
            | TxError::WorkClosed { .. }
            | TxError::InsufficientPowFund { .. }
            | TxError::BountySlotsExhausted { .. }
            | TxError::AnnouncementSlotsExhausted { .. }
            | TxError::DuplicateSubmission { .. }
            | TxError::DuplicateInBlock { .. }
            | TxError::DuplicateAnnouncement { .. }
            | TxError::UnknownSubmission { .. }
            | TxError::SubmissionAlreadyPaid { .. }
            | TxError::PayoutMismatch { .. }
            | TxError::NotWorkOwner { .. }
            | TxError::InsufficientBalance { .. } => TxErrorKind::NotCurrentlyValid,

            TxError::Store(_) | TxError::Vm(_) => TxErrorKind::Internal,
        }
    }
}

/// Result type for transaction validation and application.
pub type TxResult<T> = Result<T, TxError>;
