pub mod candle;
pub mod kline_record;
pub mod request_params;
pub mod timeframe;
pub mod year_month;
