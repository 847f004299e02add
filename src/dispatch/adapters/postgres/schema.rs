//! Diesel schema for dispatch persistence.

diesel::table! {
    /// Service task records.
    service_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional free-form description.
        description -> Nullable<Text>,
        /// Client street address.
        #[max_length = 500]
        client_address -> Varchar,
        /// Task priority.
        #[max_length = 20]
        priority -> Varchar,
        /// Task lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Currently assigned technician, if any.
        assigned_technician_id -> Nullable<Uuid>,
        /// Estimated duration in minutes, if given.
        estimated_duration_minutes -> Nullable<Int4>,
        /// Work start timestamp, if started.
        started_at -> Nullable<Timestamptz>,
        /// Dispatcher who created the task.
        created_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Assignment ledger rows; retired by status flip, never deleted.
    assignments (id) {
        /// Assignment identifier.
        id -> Uuid,
        /// Task the assignment belongs to.
        task_id -> Uuid,
        /// Assigned technician.
        technician_id -> Uuid,
        /// Assignment timestamp.
        assigned_at -> Timestamptz,
        /// Actor who recorded the assignment.
        assigned_by -> Uuid,
        /// Ledger status.
        #[max_length = 20]
        status -> Varchar,
    }
}

diesel::table! {
    /// Append-only assignment audit trail.
    assignment_history (id) {
        /// History row identifier.
        id -> Uuid,
        /// Ledger row the entry refers to.
        assignment_id -> Uuid,
        /// Task the entry refers to.
        task_id -> Uuid,
        /// Technician taking or finishing the assignment.
        technician_id -> Uuid,
        /// Previously assigned technician, if any.
        previous_technician_id -> Nullable<Uuid>,
        /// Audit action.
        #[max_length = 20]
        action -> Varchar,
        /// Acting user.
        action_by -> Uuid,
        /// Action timestamp.
        action_at -> Timestamptz,
        /// Dispatcher-supplied reason, if any.
        reason -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(service_tasks, assignments, assignment_history);
