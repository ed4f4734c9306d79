//! Fixed wording for context fragments, one set per language.

use crate::config::Language;

#[derive(Debug)]
pub struct Labels {
    pub no_data: &'static str,
    pub unavailable: &'static str,
    pub balance_anonymous: &'static str,

    pub order_header: &'static str,
    pub pending: &'static str,
    pub payment: &'static str,
    pub delivery: &'static str,
    pub next_delivery: &'static str,
    pub summary: &'static str,
    pub completed: &'static str,
    pub recent: &'static str,
    pub latest: &'static str,
    pub highest_value: &'static str,
    pub lowest_value: &'static str,
    pub average_value: &'static str,
    pub balance: &'static str,
    pub dashboard: &'static str,
    pub unpaid_amount: &'static str,
    pub upcoming: &'static str,

    pub orders: &'static str,
    pub items: &'static str,
    pub unpaid: &'static str,
    pub in_progress: &'static str,
    pub expected_within: &'static str,
    pub days: &'static str,
    pub in_transit: &'static str,
    pub delivered: &'static str,
    pub shipping: &'static str,
    pub waiting: &'static str,
    pub cancelled: &'static str,
    pub points: &'static str,

    pub user_name: &'static str,
    pub preferences: &'static str,
    pub user_balance: &'static str,
    pub topics: &'static str,
    pub conversation: &'static str,
    pub user_turn: &'static str,
    pub assistant_turn: &'static str,
    pub user_id: &'static str,
}

pub static EN: Labels = Labels {
    no_data: "No data available",
    unavailable: "Unable to retrieve data",
    balance_anonymous: "No balance data for anonymous users",

    order_header: "Order Information:",
    pending: "Pending orders",
    payment: "Payment due",
    delivery: "Deliveries",
    next_delivery: "Next delivery",
    summary: "Order summary",
    completed: "Completed orders",
    recent: "Recent orders",
    latest: "Latest order",
    highest_value: "Highest value order",
    lowest_value: "Lowest value order",
    average_value: "Average order value",
    balance: "Balance",
    dashboard: "Order overview",
    unpaid_amount: "Unpaid amount",
    upcoming: "Upcoming deliveries",

    orders: "orders",
    items: "items",
    unpaid: "unpaid",
    in_progress: "in progress",
    expected_within: "expected within",
    days: "days",
    in_transit: "in transit",
    delivered: "delivered",
    shipping: "shipping",
    waiting: "waiting",
    cancelled: "cancelled",
    points: "points",

    user_name: "User's name",
    preferences: "User preferences",
    user_balance: "User's balance",
    topics: "Recent conversation topics",
    conversation: "Recent conversation context:",
    user_turn: "User",
    assistant_turn: "Assistant",
    user_id: "User ID",
};

pub static VI: Labels = Labels {
    no_data: "Không có dữ liệu",
    unavailable: "Không thể truy xuất dữ liệu",
    balance_anonymous: "Khách chưa đăng nhập nên không có thông tin số dư",

    order_header: "Thông tin đơn hàng:",
    pending: "Đơn hàng đang chờ giao",
    payment: "Cần thanh toán",
    delivery: "Giao hàng",
    next_delivery: "Đơn sắp giao",
    summary: "Tổng quan đơn hàng",
    completed: "Đơn đã hoàn thành",
    recent: "Đơn hàng gần đây",
    latest: "Đơn hàng mới nhất",
    highest_value: "Đơn giá trị cao nhất",
    lowest_value: "Đơn giá trị thấp nhất",
    average_value: "Giá trị đơn trung bình",
    balance: "Số dư",
    dashboard: "Tổng hợp đơn hàng",
    unpaid_amount: "Số tiền chưa thanh toán",
    upcoming: "Sắp giao",

    orders: "đơn",
    items: "sản phẩm",
    unpaid: "chưa thanh toán",
    in_progress: "đang xử lý",
    expected_within: "dự kiến giao trong",
    days: "ngày",
    in_transit: "đang vận chuyển",
    delivered: "đã giao",
    shipping: "đang giao",
    waiting: "chờ xử lý",
    cancelled: "đã hủy",
    points: "điểm",

    user_name: "Tên khách hàng",
    preferences: "Tùy chọn của khách hàng",
    user_balance: "Số dư của khách hàng",
    topics: "Chủ đề gần đây",
    conversation: "Ngữ cảnh hội thoại gần đây:",
    user_turn: "Khách hàng",
    assistant_turn: "Trợ lý",
    user_id: "Mã khách hàng",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::En => &EN,
            Language::Vi => &VI,
        }
    }
}
